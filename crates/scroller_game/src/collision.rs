//! Reference simulation: a small kinematic box world behind the [`Simulation`]
//! trait, so the controller can run headless (replays, tests, the `--replay`
//! mode of the binary) without a full physics engine.
//!
//! Screen coordinates are used throughout: +y points down, velocities are in
//! world units per tick.
//!
//! Each tick, for every dynamic body:
//!  0. a body already overlapping a solid (a static body that moved or was
//!     rebuilt around it) is pushed out along the shallowest side, and never
//!     downward, so it ends up on top rather than underneath
//!  1. gravity is added to its velocity (unless it ignores gravity)
//!  2. **axis-separable move-and-slide** against static bodies: resolve X first,
//!     then resolve Y using the already-corrected X position
//!  3. blocked axes have their velocity zeroed; bodies resting on something
//!     lose `ground_damping` of their horizontal speed and pick up spin
//!
//! Sensors skip steps 0, 2 and 3 entirely and travel in straight lines.
//! After integration every touching pair (within `contact_slop`) is collected;
//! pairs absent the previous tick are reported as collision starts. The
//! persistent-contact query (`active_contacts`) is evaluated live.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;

use crate::config::SimulationConfig;
use crate::simulation::{BodyHandle, BodyOptions, BodyShape, BodyState, ContactPair, Simulation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn expanded(&self, by: f32) -> Self {
        Self {
            center: self.center,
            half: self.half + Vec2::splat(by),
        }
    }

    /// Strict overlap; boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.overlaps(other) {
            return None;
        }
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        Some(Aabb::new((min + max) * 0.5, (max - min) * 0.5))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MoveResult {
    pub aabb: Aabb,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_down: bool,
    pub blocked_up: bool,
}

#[derive(Debug, Clone)]
struct Body {
    aabb: Aabb,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,
    options: BodyOptions,
    in_world: bool,
}

pub struct KinematicWorld {
    config: SimulationConfig,
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: u32,
    active_pairs: Vec<ContactPair>,
    tick: u64,
}

impl KinematicWorld {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            bodies: BTreeMap::new(),
            next_handle: 1,
            active_pairs: Vec::new(),
            tick: 0,
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.values().filter(|b| b.in_world).count()
    }

    fn body_mut(&mut self, handle: BodyHandle, op: &str) -> Option<&mut Body> {
        let body = self.bodies.get_mut(&handle);
        if body.is_none() {
            log::warn!("{op}: unknown body {:?}, ignoring", handle);
        }
        body
    }

    fn solid_boxes(&self) -> Vec<Aabb> {
        self.bodies
            .values()
            .filter(|b| b.in_world && b.options.is_static && !b.options.is_sensor)
            .map(|b| b.aabb)
            .collect()
    }

    /// Moves `aabb` by `delta` against `solids`, X axis first.
    pub fn move_and_collide(aabb: Aabb, delta: Vec2, solids: &[Aabb]) -> MoveResult {
        const EPS: f32 = 0.0001;

        let resolved_x = resolve_axis_x(aabb, delta.x, solids);
        let collided_x = (resolved_x - (aabb.center.x + delta.x)).abs() > EPS;

        let mut moved = aabb;
        moved.center.x = resolved_x;
        let resolved_y = resolve_axis_y(moved, delta.y, solids);
        let collided_y = (resolved_y - (aabb.center.y + delta.y)).abs() > EPS;
        moved.center.y = resolved_y;

        MoveResult {
            aabb: moved,
            blocked_left: collided_x && delta.x < 0.0,
            blocked_right: collided_x && delta.x > 0.0,
            // +y is down: a body blocked while moving down is resting on something.
            blocked_down: collided_y && delta.y > 0.0,
            blocked_up: collided_y && delta.y < 0.0,
        }
    }

    fn integrate(&mut self) {
        let solids = self.solid_boxes();
        let gravity = self.config.gravity;
        let damping = self.config.ground_damping;
        let spin = self.config.contact_spin;

        for body in self.bodies.values_mut() {
            if !body.in_world || body.options.is_static {
                continue;
            }
            if !body.options.is_sensor {
                let freed = push_out(body.aabb, &solids);
                if freed != body.aabb {
                    log::debug!(
                        "Body pushed out of solid: ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                        body.aabb.center.x,
                        body.aabb.center.y,
                        freed.center.x,
                        freed.center.y
                    );
                    body.aabb = freed;
                }
            }
            if !body.options.ignore_gravity {
                body.velocity.y += gravity;
            }

            if body.options.is_sensor {
                body.aabb.center += body.velocity;
            } else {
                let result = Self::move_and_collide(body.aabb, body.velocity, &solids);
                body.aabb = result.aabb;
                if result.blocked_left || result.blocked_right {
                    body.velocity.x = 0.0;
                }
                if result.blocked_down || result.blocked_up {
                    body.velocity.y = 0.0;
                }
                if result.blocked_down {
                    body.velocity.x *= 1.0 - damping;
                    if !body.options.fixed_rotation {
                        body.angular_velocity += body.velocity.x * spin;
                    }
                }
            }

            if body.options.fixed_rotation {
                body.angular_velocity = 0.0;
            }
            body.angle += body.angular_velocity;
        }
    }

    fn collect_contacts(&self) -> Vec<ContactPair> {
        let slop = self.config.contact_slop;
        let live: Vec<(&BodyHandle, &Body)> =
            self.bodies.iter().filter(|(_, b)| b.in_world).collect();

        let mut pairs = Vec::new();
        for (i, (handle_a, body_a)) in live.iter().enumerate() {
            for (handle_b, body_b) in live.iter().skip(i + 1) {
                if body_a.options.is_static && body_b.options.is_static {
                    continue;
                }
                // Expand whichever body moves so resting contacts still register.
                let (mover, other) = if body_a.options.is_static {
                    (body_b, body_a)
                } else {
                    (body_a, body_b)
                };
                if let Some(patch) = mover.aabb.expanded(slop).intersection(&other.aabb) {
                    pairs.push(ContactPair {
                        body_a: **handle_a,
                        body_b: **handle_b,
                        points: vec![patch.center],
                    });
                }
            }
        }
        pairs
    }
}

impl Simulation for KinematicWorld {
    fn create_body(&mut self, shape: BodyShape, options: BodyOptions) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                aabb: Aabb::new(options.position, shape.half_extents()),
                velocity: Vec2::ZERO,
                angle: 0.0,
                angular_velocity: 0.0,
                options,
                in_world: false,
            },
        );
        handle
    }

    fn add_to_world(&mut self, handle: BodyHandle) {
        if let Some(body) = self.body_mut(handle, "add_to_world") {
            body.in_world = true;
        }
    }

    fn remove_from_world(&mut self, handle: BodyHandle) {
        if self.bodies.remove(&handle).is_none() {
            log::trace!("remove_from_world: {:?} already released", handle);
            return;
        }
        self.active_pairs.retain(|pair| !pair.involves(handle));
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle).map(|b| BodyState {
            position: b.aabb.center,
            velocity: b.velocity,
            angle: b.angle,
            angular_velocity: b.angular_velocity,
            half_extents: b.aabb.half,
            in_world: b.in_world,
        })
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.body_mut(handle, "set_velocity") {
            body.velocity = velocity;
        }
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.body_mut(handle, "set_position") {
            body.aabb.center = position;
        }
    }

    fn lock_orientation(&mut self, handle: BodyHandle) {
        if let Some(body) = self.body_mut(handle, "lock_orientation") {
            body.angle = 0.0;
            body.angular_velocity = 0.0;
        }
    }

    fn step(&mut self) -> Vec<ContactPair> {
        self.tick += 1;
        self.integrate();

        let previous: HashSet<(BodyHandle, BodyHandle)> = self
            .active_pairs
            .iter()
            .map(|pair| (pair.body_a, pair.body_b))
            .collect();
        let current = self.collect_contacts();
        let started: Vec<ContactPair> = current
            .iter()
            .filter(|pair| !previous.contains(&(pair.body_a, pair.body_b)))
            .cloned()
            .collect();
        if !started.is_empty() {
            log::trace!("tick {}: {} contact(s) started", self.tick, started.len());
        }
        self.active_pairs = current;
        started
    }

    /// Queried against current geometry, so bodies added or moved since the
    /// last step are already reflected.
    fn active_contacts(&self, handle: BodyHandle) -> Vec<ContactPair> {
        self.collect_contacts()
            .into_iter()
            .filter(|pair| pair.involves(handle))
            .collect()
    }
}

/// Separates `aabb` from every solid it overlaps by more than a hair: up onto
/// the solid's top, or out of its left or right side, whichever is shallowest.
fn push_out(aabb: Aabb, solids: &[Aabb]) -> Aabb {
    const EPS: f32 = 0.001;
    let mut out = aabb;

    for solid in solids {
        if !out.overlaps(solid) {
            continue;
        }
        let up = out.max().y - solid.min().y;
        let left = out.max().x - solid.min().x;
        let right = solid.max().x - out.min().x;
        if up.min(left).min(right) <= EPS {
            continue;
        }
        if up <= left && up <= right {
            out.center.y -= up;
        } else if left <= right {
            out.center.x -= left;
        } else {
            out.center.x += right;
        }
    }
    out
}

fn resolve_axis_x(aabb: Aabb, dx: f32, solids: &[Aabb]) -> f32 {
    if dx == 0.0 {
        return aabb.center.x;
    }

    const EPS: f32 = 0.001;
    let mut candidate_x = aabb.center.x + dx;
    let min_y = aabb.min().y + EPS;
    let max_y = aabb.max().y - EPS;

    for solid in solids {
        let (s_min, s_max) = (solid.min(), solid.max());
        if max_y <= s_min.y || min_y >= s_max.y {
            continue;
        }
        if dx > 0.0 {
            // Only block solids that were ahead of us before the move.
            if aabb.max().x <= s_min.x + EPS && candidate_x + aabb.half.x > s_min.x {
                candidate_x = candidate_x.min(s_min.x - aabb.half.x);
            }
        } else if aabb.min().x >= s_max.x - EPS && candidate_x - aabb.half.x < s_max.x {
            candidate_x = candidate_x.max(s_max.x + aabb.half.x);
        }
    }

    // Guardrail: never push opposite direction during resolution.
    if dx > 0.0 {
        candidate_x.max(aabb.center.x)
    } else {
        candidate_x.min(aabb.center.x)
    }
}

fn resolve_axis_y(aabb: Aabb, dy: f32, solids: &[Aabb]) -> f32 {
    if dy == 0.0 {
        return aabb.center.y;
    }

    const EPS: f32 = 0.001;
    let mut candidate_y = aabb.center.y + dy;
    let min_x = aabb.min().x + EPS;
    let max_x = aabb.max().x - EPS;

    for solid in solids {
        let (s_min, s_max) = (solid.min(), solid.max());
        if max_x <= s_min.x || min_x >= s_max.x {
            continue;
        }
        if dy > 0.0 {
            if aabb.max().y <= s_min.y + EPS && candidate_y + aabb.half.y > s_min.y {
                candidate_y = candidate_y.min(s_min.y - aabb.half.y);
            }
        } else if aabb.min().y >= s_max.y - EPS && candidate_y - aabb.half.y < s_max.y {
            candidate_y = candidate_y.max(s_max.y + aabb.half.y);
        }
    }

    if dy > 0.0 {
        candidate_y.max(aabb.center.y)
    } else {
        candidate_y.min(aabb.center.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> KinematicWorld {
        KinematicWorld::new(SimulationConfig {
            gravity: 1.0,
            ground_damping: 0.0,
            contact_slop: 0.5,
            contact_spin: 0.0,
        })
    }

    fn add(world: &mut KinematicWorld, shape: BodyShape, options: BodyOptions) -> BodyHandle {
        let handle = world.create_body(shape, options);
        world.add_to_world(handle);
        handle
    }

    fn floor(world: &mut KinematicWorld) -> BodyHandle {
        add(
            world,
            BodyShape::Rectangle {
                width: 400.0,
                height: 20.0,
            },
            BodyOptions::fixed(Vec2::new(200.0, 110.0)),
        )
    }

    fn crate_box(world: &mut KinematicWorld, at: Vec2) -> BodyHandle {
        add(
            world,
            BodyShape::Rectangle {
                width: 10.0,
                height: 10.0,
            },
            BodyOptions::dynamic(at),
        )
    }

    #[test]
    fn falling_body_lands_and_reports_one_contact_start() {
        let mut world = world();
        let ground = floor(&mut world);
        let body = crate_box(&mut world, Vec2::new(50.0, 80.0));

        let mut starts = 0;
        for _ in 0..30 {
            let started = world.step();
            starts += started.iter().filter(|p| p.involves(body)).count();
        }

        let state = world.body(body).expect("body exists");
        // floor top is y=100, half height 5
        assert!((state.position.y - 95.0).abs() < 1e-3);
        assert_eq!(state.velocity.y, 0.0);
        assert_eq!(starts, 1);
        let active = world.active_contacts(body);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].other(body), Some(ground));
        assert!(active[0].points[0].y >= 100.0);
    }

    #[test]
    fn body_inside_solid_is_lifted_onto_its_top() {
        let mut world = world();
        let ground = floor(&mut world);
        // sunk 8 units into the floor (top y=100), closer to its bottom than its top
        let body = crate_box(&mut world, Vec2::new(50.0, 108.0));

        let started = world.step();
        let state = world.body(body).expect("body exists");
        assert!((state.position.y - 95.0).abs() < 1e-3);
        assert_eq!(state.velocity.y, 0.0);
        assert!(started.iter().any(|p| p.other(body) == Some(ground)));

        for _ in 0..20 {
            world.step();
        }
        assert!((world.body(body).expect("body exists").position.y - 95.0).abs() < 1e-3);
    }

    #[test]
    fn push_out_prefers_the_shallowest_side() {
        let wall = Aabb::new(Vec2::new(100.0, 0.0), Vec2::new(10.0, 50.0));
        let clipped = Aabb::new(Vec2::new(84.0, 0.0), Vec2::new(8.0, 8.0));
        let freed = push_out(clipped, &[wall]);
        assert!((freed.center.x - 82.0).abs() < 1e-4);
        assert_eq!(freed.center.y, 0.0);

        // resting exactly on the top edge is not an overlap
        let resting = Aabb::new(Vec2::new(100.0, -58.0), Vec2::new(8.0, 8.0));
        assert_eq!(push_out(resting, &[wall]), resting);
    }

    #[test]
    fn move_and_collide_blocks_motion_into_wall() {
        let wall = Aabb::new(Vec2::new(100.0, 0.0), Vec2::new(10.0, 50.0));
        let start = Aabb::new(Vec2::new(60.0, 0.0), Vec2::new(8.0, 8.0));
        let result = KinematicWorld::move_and_collide(start, Vec2::new(40.0, 0.0), &[wall]);
        assert!(result.blocked_right);
        assert!(!result.blocked_left);
        assert!((result.aabb.center.x - 82.0).abs() < 1e-4);
    }

    #[test]
    fn move_up_beside_obstacle_does_not_push_downward() {
        let side = Aabb::new(Vec2::new(20.0, 0.0), Vec2::new(4.0, 40.0));
        let start = Aabb::new(Vec2::new(8.0, 0.0), Vec2::new(8.0, 8.0));
        let result = KinematicWorld::move_and_collide(start, Vec2::new(0.0, -10.0), &[side]);
        assert!(result.aabb.center.y <= start.center.y);
        assert!(!result.blocked_up);
    }

    #[test]
    fn sensors_fly_straight_through_solids() {
        let mut world = world();
        floor(&mut world);
        let shot = add(
            &mut world,
            BodyShape::Circle { radius: 2.0 },
            BodyOptions {
                is_sensor: true,
                ignore_gravity: true,
                ..BodyOptions::dynamic(Vec2::new(0.0, 105.0))
            },
        );
        world.set_velocity(shot, Vec2::new(10.0, 0.0));
        for _ in 0..10 {
            world.step();
        }
        let state = world.body(shot).expect("shot exists");
        assert_eq!(state.position, Vec2::new(100.0, 105.0));
        assert_eq!(state.velocity, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn resting_contact_spins_unless_locked() {
        let mut world = KinematicWorld::new(SimulationConfig {
            contact_spin: 0.01,
            ..SimulationConfig::default()
        });
        floor(&mut world);
        let body = crate_box(&mut world, Vec2::new(50.0, 95.0));
        world.set_velocity(body, Vec2::new(3.0, 0.0));
        world.step();
        assert!(world.body(body).expect("body").angle.abs() > 0.0);

        world.lock_orientation(body);
        let state = world.body(body).expect("body");
        assert_eq!(state.angle, 0.0);
        assert_eq!(state.angular_velocity, 0.0);
    }

    #[test]
    fn removed_bodies_leave_contacts_and_ignore_commands() {
        let mut world = world();
        floor(&mut world);
        let body = crate_box(&mut world, Vec2::new(50.0, 95.0));
        world.step();
        assert_eq!(world.active_contacts(body).len(), 1);

        world.remove_from_world(body);
        assert!(world.body(body).is_none());
        assert!(world.active_contacts(body).is_empty());
        // Second release and stale commands are harmless.
        world.remove_from_world(body);
        world.set_velocity(body, Vec2::ONE);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn bodies_outside_world_do_not_move() {
        let mut world = world();
        let handle = world.create_body(
            BodyShape::Rectangle {
                width: 4.0,
                height: 4.0,
            },
            BodyOptions::dynamic(Vec2::ZERO),
        );
        world.step();
        let state = world.body(handle).expect("created");
        assert!(!state.in_world);
        assert_eq!(state.position, Vec2::ZERO);
    }
}
