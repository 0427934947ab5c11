//! Smoothed follow camera.
//!
//! The camera keeps a top-left `offset` in world space (+y down) that chases a
//! target derived from the player position every tick:
//!
//! ```text
//! target  = player - viewport / 2
//! offset += (target - offset) * smoothing
//! ```
//!
//! `offset` is only ever written by that smoothing update (and by `snap_to`
//! when a level is first placed), so the renderer can read `bounds()` at any
//! point without seeing a half-applied jump.

use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Visible world rectangle handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ViewportBounds {
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

pub struct Camera2D {
    offset: Vec2,
    target: Vec2,
    smoothing: f32,
    viewport: Vec2,
}

impl Camera2D {
    /// `smoothing` is clamped into `(0, 1]`; a value of 1 snaps every tick.
    pub fn new(viewport: Vec2, smoothing: f32) -> Self {
        let smoothing = if smoothing.is_finite() && smoothing > 0.0 {
            smoothing.min(1.0)
        } else {
            log::warn!("Camera smoothing {smoothing} out of range, using 1.0");
            1.0
        };
        Self {
            offset: Vec2::ZERO,
            target: Vec2::ZERO,
            smoothing,
            viewport,
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Takes effect on the next `follow`; the offset itself is not touched.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn target_for(&self, player_position: Vec2) -> Vec2 {
        player_position - self.viewport * 0.5
    }

    pub fn follow(&mut self, player_position: Vec2) {
        self.target = self.target_for(player_position);
        self.offset += (self.target - self.offset) * self.smoothing;
        log::trace!(
            "camera offset ({:.2}, {:.2}) -> target ({:.2}, {:.2})",
            self.offset.x,
            self.offset.y,
            self.target.x,
            self.target.y
        );
    }

    /// Places the camera on the player immediately, without easing in from the
    /// origin. Used once when a level is spawned.
    pub fn snap_to(&mut self, player_position: Vec2) {
        self.target = self.target_for(player_position);
        self.offset = self.target;
    }

    pub fn bounds(&self) -> ViewportBounds {
        ViewportBounds {
            min: self.offset,
            max: self.offset + self.viewport,
        }
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let bounds = self.bounds();
        // +y is down in world space, so the top edge is `min.y`.
        let proj = Mat4::orthographic_rh(
            bounds.min.x,
            bounds.max.x,
            bounds.max.y,
            bounds.min.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}
