//! Tunables for every gameplay system, loadable from a JSON file.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Units: world units, world units per tick, milliseconds.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::ground::GroundingPolicy;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub accel: f32,
    pub speed_limit: f32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct MovementConfig {
    pub grounded: MotionProfile,
    pub airborne: MotionProfile,
    /// Multiplier applied to horizontal speed each idle airborne tick.
    /// 1.0 disables drift decay.
    pub air_drift_decay: f32,
    pub jump_speed: f32,
    pub double_jump_speed: f32,
    pub facing_deadband: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            grounded: MotionProfile {
                accel: 2.4,
                speed_limit: 8.0,
            },
            airborne: MotionProfile {
                accel: 1.2,
                speed_limit: 6.0,
            },
            air_drift_decay: 0.95,
            jump_speed: 15.0,
            double_jump_speed: 10.0,
            facing_deadband: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct GroundConfig {
    /// How far below the player's center a contact point must be to count as
    /// support.
    pub support_threshold: f32,
    pub policy: GroundingPolicy,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            support_threshold: 10.0,
            policy: GroundingPolicy::PersistentContacts,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CameraConfig {
    pub smoothing: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { smoothing: 0.1 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ProjectileConfig {
    pub cooldown_ms: u64,
    pub ttl_ms: u64,
    pub speed: f32,
    pub muzzle_offset: f32,
    pub radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 200,
            ttl_ms: 3000,
            speed: 12.0,
            muzzle_offset: 30.0,
            radius: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct WorldConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub pixel_ratio: f32,
    pub ground_thickness: f32,
    /// Extra ground width past each side edge of the viewport.
    pub ground_overhang: f32,
    /// Distance of the ground's center below the viewport's bottom edge.
    pub ground_bottom_offset: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            pixel_ratio: 1.0,
            ground_thickness: 60.0,
            ground_overhang: 5.0,
            ground_bottom_offset: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SimulationConfig {
    pub gravity: f32,
    /// Fraction of horizontal speed a resting body loses per tick.
    pub ground_damping: f32,
    pub contact_slop: f32,
    /// Angular velocity picked up per unit of horizontal speed while resting.
    pub contact_spin: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: 0.6,
            ground_damping: 0.1,
            contact_slop: 0.5,
            contact_spin: 0.002,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct GameConfig {
    pub movement: MovementConfig,
    pub ground: GroundConfig,
    pub camera: CameraConfig,
    pub projectile: ProjectileConfig,
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub simulation: SimulationConfig,
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    let movement = &config.movement;
    for (name, profile) in [("grounded", movement.grounded), ("airborne", movement.airborne)] {
        if profile.accel <= 0.0 || profile.speed_limit <= 0.0 {
            return Err(format!(
                "Config validation failed: {name} accel and speed_limit must be > 0"
            ));
        }
    }
    if movement.airborne.speed_limit > movement.grounded.speed_limit
        || movement.airborne.accel > movement.grounded.accel
    {
        return Err(
            "Config validation failed: airborne profile must not exceed grounded profile"
                .to_string(),
        );
    }
    if !(0.0..=1.0).contains(&movement.air_drift_decay) {
        return Err("Config validation failed: air_drift_decay must be within [0, 1]".to_string());
    }
    if movement.jump_speed <= 0.0 || movement.double_jump_speed <= 0.0 {
        return Err("Config validation failed: jump speeds must be > 0".to_string());
    }
    if movement.facing_deadband < 0.0 {
        return Err("Config validation failed: facing_deadband must be >= 0".to_string());
    }

    if config.ground.support_threshold < 0.0 {
        return Err("Config validation failed: support_threshold must be >= 0".to_string());
    }

    let smoothing = config.camera.smoothing;
    if !(smoothing > 0.0 && smoothing <= 1.0) {
        return Err("Config validation failed: camera smoothing must be within (0, 1]".to_string());
    }

    let projectile = &config.projectile;
    if projectile.ttl_ms == 0 {
        return Err("Config validation failed: projectile ttl_ms must be > 0".to_string());
    }
    if projectile.speed <= 0.0 || projectile.radius <= 0.0 {
        return Err("Config validation failed: projectile speed and radius must be > 0".to_string());
    }

    let world = &config.world;
    if world.viewport_width <= 0.0 || world.viewport_height <= 0.0 || world.pixel_ratio <= 0.0 {
        return Err(
            "Config validation failed: initial viewport and pixel_ratio must be > 0".to_string(),
        );
    }
    if world.ground_thickness <= 0.0 || world.ground_overhang < 0.0 {
        return Err("Config validation failed: ground dimensions out of range".to_string());
    }

    if config.player.width <= 0.0 || config.player.height <= 0.0 {
        return Err("Config validation failed: player size must be > 0".to_string());
    }

    let sim = &config.simulation;
    if !(0.0..=1.0).contains(&sim.ground_damping) || sim.contact_slop < 0.0 {
        return Err("Config validation failed: simulation damping or slop out of range".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "scroller_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_are_valid() {
        validate_config(&GameConfig::default()).expect("defaults should validate");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{
              "movement": { "jump_speed": 18.0 },
              "ground": { "policy": { "mode": "collision_start_with_grace", "grace_ticks": 4 } },
              "projectile": { "cooldown_ms": 150 }
            }"#,
        )
        .expect("write temp file");

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.movement.jump_speed, 18.0);
        assert_eq!(config.movement.double_jump_speed, 10.0);
        assert_eq!(config.projectile.cooldown_ms, 150);
        assert_eq!(config.projectile.ttl_ms, 3000);
        assert_eq!(
            config.ground.policy,
            GroundingPolicy::CollisionStartWithGrace { grace_ticks: 4 }
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_airborne_faster_than_grounded() {
        let mut config = GameConfig::default();
        config.movement.airborne.speed_limit = 20.0;
        let err = validate_config(&config).expect_err("should fail");
        assert!(err.contains("airborne profile"));
    }

    #[test]
    fn rejects_zero_smoothing() {
        let path = temp_file_path("smoothing");
        fs::write(&path, r#"{ "camera": { "smoothing": 0.0 } }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("zero smoothing should fail");
        assert!(err.contains("camera smoothing"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn reports_missing_file() {
        let err = load_config_from_path(Path::new("/definitely/not/here.json"))
            .expect_err("missing file should fail");
        assert!(err.contains("Failed to read"));
    }
}
