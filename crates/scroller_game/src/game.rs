//! Fixed-step scheduler that owns every controller component.
//!
//! One call to [`Game::tick`] runs the phases in a fixed order:
//!
//!   a. **collision** -- the ground detector consumes contacts from the
//!      previous integration (or the live contact query, depending on policy)
//!   b. **pre-integration** -- the movement controller issues the velocity
//!      command and orientation lock; projectile timers run and fire input is
//!      handled
//!   c. **integration** -- the simulation steps; its collision-start pairs are
//!      kept for the next tick's phase a
//!   d. **post-integration** -- orientation is re-asserted and the camera
//!      follows the player's new position
//!
//! Key and resize events may arrive at any time between ticks and are merged
//! immediately; no phase ever observes them mid-update.

use glam::Vec2;
use scroller_core::input::{Action, ActionSnapshot, InputState, Key};
use scroller_render::{Camera2D, CameraUniform, ViewportBounds};

use crate::config::{validate_config, GameConfig};
use crate::controller::{Facing, JumpStage, MovementController};
use crate::ground::{GroundContactDetector, GroundingPolicy};
use crate::level::LevelFile;
use crate::projectile::{ProjectileId, ProjectileManager, ProjectileView};
use crate::simulation::{BodyHandle, BodyOptions, BodyShape, ContactPair, Simulation};
use crate::world::{RenderScale, ResizeAdapter, ResizeOutcome, ViewportSize};

/// Player state as the renderer and tests see it after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub facing: Facing,
    pub grounded: bool,
    pub jump_stage: JumpStage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub grounded: bool,
    pub landed: bool,
    pub jumped: Option<JumpStage>,
    pub fired: Option<ProjectileId>,
    pub expired: usize,
    pub bounds: ViewportBounds,
}

pub struct Game<S: Simulation> {
    sim: S,
    config: GameConfig,
    input: InputState,
    ground: GroundContactDetector,
    controller: MovementController,
    projectiles: ProjectileManager,
    camera: Camera2D,
    world: ResizeAdapter,
    player: BodyHandle,
    pending_starts: Vec<ContactPair>,
    tick: u64,
}

impl<S: Simulation> Game<S> {
    pub fn new(config: GameConfig, level: &LevelFile, mut sim: S) -> Result<Self, String> {
        validate_config(&config)?;

        let world = ResizeAdapter::new(config.world, &level.platforms, &mut sim)?;

        let spawn = level.player_spawn.position();
        let player = sim.create_body(
            BodyShape::Capsule {
                width: config.player.width,
                height: config.player.height,
            },
            BodyOptions::dynamic(spawn),
        );
        sim.add_to_world(player);

        let mut ground = GroundContactDetector::new(
            player,
            config.ground.support_threshold,
            config.ground.policy,
        );
        for collider in world.static_colliders() {
            ground.register_static(collider);
        }

        let mut camera = Camera2D::new(world.viewport().size(), config.camera.smoothing);
        camera.snap_to(spawn);

        log::info!(
            "Level '{}' ready: {} platform(s), player at ({:.0}, {:.0}), grounding {:?}",
            level.level_id,
            world.platforms().len(),
            spawn.x,
            spawn.y,
            config.ground.policy
        );

        Ok(Self {
            sim,
            config,
            input: InputState::new(),
            ground,
            controller: MovementController::new(config.movement),
            projectiles: ProjectileManager::new(config.projectile),
            camera,
            world,
            player,
            pending_starts: Vec::new(),
            tick: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn world(&self) -> &ResizeAdapter {
        &self.world
    }

    pub fn controller(&self) -> &MovementController {
        &self.controller
    }

    pub fn projectiles(&self) -> &ProjectileManager {
        &self.projectiles
    }

    pub fn player(&self) -> BodyHandle {
        self.player
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn handle_key(&mut self, key: Key, pressed: bool) -> Option<Action> {
        self.input.handle_key(key, pressed)
    }

    pub fn set_action(&mut self, action: Action, pressed: bool) {
        self.input.set_action(action, pressed);
    }

    pub fn apply_snapshot(&mut self, snapshot: &ActionSnapshot) {
        self.input.apply_snapshot(snapshot);
    }

    pub fn handle_resize(&mut self, size: ViewportSize) -> Result<ResizeOutcome, String> {
        let outcome = self.world.resize(size, &mut self.sim, &mut self.camera)?;
        if let ResizeOutcome::Applied {
            replaced_ground: Some(old_ground),
        } = outcome
        {
            self.ground.unregister_static(old_ground);
            self.ground.register_static(self.world.ground());
        }
        Ok(outcome)
    }

    pub fn viewport_bounds(&self) -> ViewportBounds {
        self.camera.bounds()
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.camera.build_uniform()
    }

    pub fn render_scale(&self) -> RenderScale {
        self.world.render_scale()
    }

    pub fn projectile_views(&self, now_ms: u64) -> Vec<ProjectileView> {
        self.projectiles.views(now_ms, &self.sim)
    }

    pub fn player_snapshot(&self) -> Option<PlayerSnapshot> {
        let state = self.sim.body(self.player)?;
        Some(PlayerSnapshot {
            position: state.position,
            velocity: state.velocity,
            angle: state.angle,
            facing: self.controller.facing(),
            grounded: self.controller.is_grounded(),
            jump_stage: self.controller.stage(),
        })
    }

    /// Runs one fixed step. `now_ms` drives the projectile timers.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        self.tick += 1;

        let Some(player_state) = self.sim.body(self.player) else {
            log::warn!("Tick {}: player body missing, skipping", self.tick);
            self.input.end_tick();
            return self.idle_report();
        };

        // a. collision
        let starts = std::mem::take(&mut self.pending_starts);
        let contacts = match self.ground.policy() {
            GroundingPolicy::PersistentContacts => self.sim.active_contacts(self.player),
            GroundingPolicy::CollisionStartWithGrace { .. } => starts,
        };
        let ground_update = self.ground.update(player_state.position, &contacts);

        // b. pre-integration
        let command = self
            .controller
            .update(&self.input, ground_update, player_state.velocity);
        if command.jumped.is_some() {
            self.ground.clear();
        }
        self.sim.set_velocity(self.player, command.velocity);
        if command.lock_orientation {
            self.sim.lock_orientation(self.player);
        }

        let expired = self.projectiles.expire(now_ms, &mut self.sim);
        let fired = if self.input.is_pressed(Action::Fire) {
            self.projectiles
                .fire(player_state.position, command.facing, now_ms, &mut self.sim)
        } else {
            None
        };

        // c. integration
        self.pending_starts = self.sim.step();

        // d. post-integration
        if command.lock_orientation {
            self.sim.lock_orientation(self.player);
        }
        let position = self
            .sim
            .body(self.player)
            .map_or(player_state.position, |state| state.position);
        self.camera.follow(position);

        self.input.end_tick();

        log::trace!(
            "tick {}: pos ({:.2}, {:.2}) vel ({:.2}, {:.2}) grounded {} stage {}",
            self.tick,
            position.x,
            position.y,
            command.velocity.x,
            command.velocity.y,
            ground_update.grounded,
            self.controller.stage().index()
        );

        TickReport {
            tick: self.tick,
            grounded: ground_update.grounded,
            landed: ground_update.landed,
            jumped: command.jumped,
            fired,
            expired,
            bounds: self.camera.bounds(),
        }
    }

    fn idle_report(&self) -> TickReport {
        TickReport {
            tick: self.tick,
            grounded: false,
            landed: false,
            jumped: None,
            fired: None,
            expired: 0,
            bounds: self.camera.bounds(),
        }
    }
}
