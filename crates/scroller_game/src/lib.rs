//! Movement and camera controller for a 2D side-scroller.
//!
//! [`game::Game`] owns the per-tick pipeline; everything else is a component
//! it drives. The physics engine sits behind [`simulation::Simulation`] and
//! [`collision::KinematicWorld`] is the in-tree implementation.

pub mod collision;
pub mod config;
pub mod controller;
pub mod game;
pub mod ground;
pub mod level;
pub mod projectile;
pub mod replay;
pub mod simulation;
pub mod world;

pub use game::{Game, PlayerSnapshot, TickReport};
