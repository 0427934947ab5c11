use glam::Vec2;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub player_spawn: SpawnPoint,
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

impl SpawnPoint {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Static platform, positioned by its center.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlatformDef {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LevelFile {
    /// Built-in layout for an 800x600 window: two floating platforms above the
    /// ground strip.
    pub fn builtin() -> Self {
        Self {
            version: "0.1".to_string(),
            level_id: "builtin".to_string(),
            player_spawn: SpawnPoint { x: 200.0, y: 450.0 },
            platforms: vec![
                PlatformDef {
                    id: "ledge_low".to_string(),
                    x: 400.0,
                    y: 460.0,
                    width: 160.0,
                    height: 20.0,
                },
                PlatformDef {
                    id: "ledge_high".to_string(),
                    x: 620.0,
                    y: 360.0,
                    width: 140.0,
                    height: 20.0,
                },
            ],
        }
    }
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

pub fn validate_level(level: &LevelFile) -> Result<(), String> {
    if level.level_id.trim().is_empty() {
        return Err("Level validation failed: level_id is empty".to_string());
    }
    if !level.player_spawn.x.is_finite() || !level.player_spawn.y.is_finite() {
        return Err("Level validation failed: player_spawn must be finite".to_string());
    }

    let mut ids = HashSet::new();
    for platform in &level.platforms {
        if !ids.insert(platform.id.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate platform id '{}'",
                platform.id
            ));
        }
        if platform.width <= 0.0 || platform.height <= 0.0 {
            return Err(format!(
                "Level validation failed: platform '{}' must have positive width and height",
                platform.id
            ));
        }
    }
    Ok(())
}
