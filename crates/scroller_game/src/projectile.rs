//! Projectile spawn/despawn with a fire cooldown and per-projectile lifetime.
//!
//! Both timers run on millisecond timestamps from a `Clock`, not on ticks. A
//! projectile owns its simulation body from spawn to despawn; releasing the
//! projectile always releases the body too.

use glam::Vec2;

use crate::config::ProjectileConfig;
use crate::controller::Facing;
use crate::simulation::{BodyHandle, BodyOptions, BodyShape, Simulation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub body: BodyHandle,
    pub direction: Facing,
    pub expires_at_ms: u64,
}

impl Projectile {
    pub fn remaining_ttl_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms.saturating_sub(now_ms)
    }
}

/// Projectile as handed to the renderer: simulation state plus remaining TTL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub facing: Facing,
    pub position: Vec2,
    pub velocity: Vec2,
    pub remaining_ttl_ms: u64,
}

pub struct ProjectileManager {
    config: ProjectileConfig,
    projectiles: Vec<Projectile>,
    next_id: u64,
    cooldown_until_ms: Option<u64>,
}

impl ProjectileManager {
    pub fn new(config: ProjectileConfig) -> Self {
        Self {
            config,
            projectiles: Vec::new(),
            next_id: 1,
            cooldown_until_ms: None,
        }
    }

    pub fn active(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn cooldown_active(&self, now_ms: u64) -> bool {
        self.cooldown_until_ms.is_some_and(|until| now_ms < until)
    }

    pub fn remaining_ttl(&self, id: ProjectileId, now_ms: u64) -> Option<u64> {
        self.projectiles
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.remaining_ttl_ms(now_ms))
    }

    /// Spawns a projectile unless the cooldown is running. A rejected fire is
    /// not an error; it simply returns `None`.
    pub fn fire<S: Simulation + ?Sized>(
        &mut self,
        origin: Vec2,
        facing: Facing,
        now_ms: u64,
        sim: &mut S,
    ) -> Option<ProjectileId> {
        if self.cooldown_active(now_ms) {
            log::trace!("Fire rejected: cooldown active at {now_ms}ms");
            return None;
        }

        let direction = match facing {
            Facing::Right => Vec2::X,
            Facing::Left => Vec2::NEG_X,
        };
        let position = origin + direction * self.config.muzzle_offset;
        let body = sim.create_body(
            BodyShape::Circle {
                radius: self.config.radius,
            },
            BodyOptions {
                is_sensor: true,
                ignore_gravity: true,
                fixed_rotation: true,
                ..BodyOptions::dynamic(position)
            },
        );
        sim.set_velocity(body, direction * self.config.speed);
        sim.add_to_world(body);

        let id = ProjectileId(self.next_id);
        self.next_id += 1;
        self.projectiles.push(Projectile {
            id,
            body,
            direction: facing,
            expires_at_ms: now_ms + self.config.ttl_ms,
        });
        self.cooldown_until_ms = Some(now_ms + self.config.cooldown_ms);
        log::debug!(
            "Fired projectile {} at ({:.1}, {:.1}) facing {:?}",
            id.0,
            position.x,
            position.y,
            facing
        );
        Some(id)
    }

    /// Removes every projectile whose lifetime has elapsed. Returns how many
    /// were removed.
    pub fn expire<S: Simulation + ?Sized>(&mut self, now_ms: u64, sim: &mut S) -> usize {
        let before = self.projectiles.len();
        self.projectiles.retain(|projectile| {
            if now_ms >= projectile.expires_at_ms {
                sim.remove_from_world(projectile.body);
                log::debug!("Projectile {} expired", projectile.id.0);
                false
            } else {
                true
            }
        });
        before - self.projectiles.len()
    }

    /// Early removal. Unknown or already removed ids are a no-op.
    pub fn despawn<S: Simulation + ?Sized>(&mut self, id: ProjectileId, sim: &mut S) -> bool {
        let Some(index) = self.projectiles.iter().position(|p| p.id == id) else {
            return false;
        };
        let projectile = self.projectiles.swap_remove(index);
        sim.remove_from_world(projectile.body);
        true
    }

    pub fn clear<S: Simulation + ?Sized>(&mut self, sim: &mut S) {
        for projectile in self.projectiles.drain(..) {
            sim.remove_from_world(projectile.body);
        }
    }

    pub fn views<S: Simulation + ?Sized>(&self, now_ms: u64, sim: &S) -> Vec<ProjectileView> {
        self.projectiles
            .iter()
            .filter_map(|projectile| {
                let state = sim.body(projectile.body)?;
                Some(ProjectileView {
                    id: projectile.id,
                    facing: projectile.direction,
                    position: state.position,
                    velocity: state.velocity,
                    remaining_ttl_ms: projectile.remaining_ttl_ms(now_ms),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::KinematicWorld;
    use crate::config::SimulationConfig;

    fn setup() -> (ProjectileManager, KinematicWorld) {
        (
            ProjectileManager::new(ProjectileConfig::default()),
            KinematicWorld::new(SimulationConfig::default()),
        )
    }

    #[test]
    fn fire_spawns_at_muzzle_with_straight_velocity() {
        let (mut manager, mut world) = setup();
        let id = manager
            .fire(Vec2::new(100.0, 50.0), Facing::Left, 0, &mut world)
            .expect("first fire succeeds");

        let views = manager.views(0, &world);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, id);
        assert_eq!(views[0].facing, Facing::Left);
        assert_eq!(views[0].position, Vec2::new(70.0, 50.0));
        assert_eq!(views[0].velocity, Vec2::new(-12.0, 0.0));
        assert_eq!(views[0].remaining_ttl_ms, 3000);

        for _ in 0..10 {
            world.step();
        }
        let moved = manager.views(160, &world);
        assert_eq!(moved[0].position, Vec2::new(-50.0, 50.0));
        assert_eq!(moved[0].remaining_ttl_ms, 2840);
    }

    #[test]
    fn fire_within_cooldown_is_rejected() {
        let (mut manager, mut world) = setup();
        assert!(manager.fire(Vec2::ZERO, Facing::Right, 1000, &mut world).is_some());
        assert!(manager.fire(Vec2::ZERO, Facing::Right, 1001, &mut world).is_none());
        assert!(manager.fire(Vec2::ZERO, Facing::Right, 1199, &mut world).is_none());
        assert!(manager.fire(Vec2::ZERO, Facing::Right, 1200, &mut world).is_some());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn rapid_fire_succeeds_once_per_window() {
        let (mut manager, mut world) = setup();
        let mut successes = Vec::new();
        for now in 0..1000 {
            if manager.fire(Vec2::ZERO, Facing::Right, now, &mut world).is_some() {
                successes.push(now);
            }
        }
        assert_eq!(successes, vec![0, 200, 400, 600, 800]);
    }

    #[test]
    fn count_returns_to_baseline_exactly_at_ttl() {
        let (mut manager, mut world) = setup();
        let baseline_bodies = world.body_count();
        manager.fire(Vec2::ZERO, Facing::Right, 500, &mut world);
        assert_eq!(manager.len(), 1);

        assert_eq!(manager.expire(3499, &mut world), 0);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.expire(3500, &mut world), 1);
        assert!(manager.is_empty());
        assert_eq!(world.body_count(), baseline_bodies);
    }

    #[test]
    fn projectiles_expire_independently() {
        let (mut manager, mut world) = setup();
        let first = manager
            .fire(Vec2::ZERO, Facing::Right, 0, &mut world)
            .expect("fire");
        let second = manager
            .fire(Vec2::ZERO, Facing::Right, 1000, &mut world)
            .expect("fire");

        manager.expire(3000, &mut world);
        assert_eq!(manager.remaining_ttl(first, 3000), None);
        assert_eq!(manager.remaining_ttl(second, 3000), Some(1000));
        manager.expire(4000, &mut world);
        assert!(manager.is_empty());
    }

    #[test]
    fn expiry_after_despawn_is_no_op() {
        let (mut manager, mut world) = setup();
        let id = manager
            .fire(Vec2::ZERO, Facing::Right, 0, &mut world)
            .expect("fire");
        assert!(manager.despawn(id, &mut world));
        assert!(!manager.despawn(id, &mut world));
        assert_eq!(manager.expire(5000, &mut world), 0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn clear_releases_every_body() {
        let (mut manager, mut world) = setup();
        manager.fire(Vec2::ZERO, Facing::Right, 0, &mut world);
        manager.fire(Vec2::ZERO, Facing::Left, 300, &mut world);
        assert_eq!(world.body_count(), 2);
        manager.clear(&mut world);
        assert!(manager.is_empty());
        assert_eq!(world.body_count(), 0);
    }
}
