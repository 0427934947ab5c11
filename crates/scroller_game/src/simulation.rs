//! Boundary to the rigid-body simulation.
//!
//! The controller never resolves collisions itself. It creates bodies, reads
//! their state, writes velocity/position commands and asks for contacts; all
//! of that goes through [`Simulation`]. `KinematicWorld` in `collision.rs` is
//! the in-tree implementation used for headless runs and tests.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Rectangle { width: f32, height: f32 },
    /// Rounded box; simulations without native capsules may treat it as its
    /// bounding rectangle.
    Capsule { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl BodyShape {
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            BodyShape::Rectangle { width, height } | BodyShape::Capsule { width, height } => {
                Vec2::new(width * 0.5, height * 0.5)
            }
            BodyShape::Circle { radius } => Vec2::splat(radius),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyOptions {
    pub position: Vec2,
    pub is_static: bool,
    /// Sensors report overlaps but never receive a collision response.
    pub is_sensor: bool,
    pub ignore_gravity: bool,
    pub fixed_rotation: bool,
}

impl BodyOptions {
    pub fn dynamic(position: Vec2) -> Self {
        Self {
            position,
            is_static: false,
            is_sensor: false,
            ignore_gravity: false,
            fixed_rotation: false,
        }
    }

    pub fn fixed(position: Vec2) -> Self {
        Self {
            is_static: true,
            ignore_gravity: true,
            fixed_rotation: true,
            ..Self::dynamic(position)
        }
    }
}

/// Snapshot of one body as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub half_extents: Vec2,
    pub in_world: bool,
}

/// Two bodies touching, with the contact points of the manifold.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub points: Vec<Vec2>,
}

impl ContactPair {
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.body_a == handle || self.body_b == handle
    }

    /// The body on the other side of the pair from `handle`.
    pub fn other(&self, handle: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == handle {
            Some(self.body_b)
        } else if self.body_b == handle {
            Some(self.body_a)
        } else {
            None
        }
    }
}

pub trait Simulation {
    fn create_body(&mut self, shape: BodyShape, options: BodyOptions) -> BodyHandle;
    fn add_to_world(&mut self, handle: BodyHandle);
    /// Releases the body. Unknown or already removed handles are ignored.
    fn remove_from_world(&mut self, handle: BodyHandle);

    fn body(&self, handle: BodyHandle) -> Option<BodyState>;
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);
    fn set_position(&mut self, handle: BodyHandle, position: Vec2);
    /// Zeroes angle and angular velocity.
    fn lock_orientation(&mut self, handle: BodyHandle);

    /// Integrates one tick and returns the contact pairs that started during it.
    fn step(&mut self) -> Vec<ContactPair>;
    /// Contacts currently held by `handle`, whether or not they started this tick.
    fn active_contacts(&self, handle: BodyHandle) -> Vec<ContactPair>;
}
