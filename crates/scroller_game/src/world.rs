//! Static world geometry and its response to viewport resizes.
//!
//! The ground strip is sized from the viewport: it spans the full width (plus
//! a small overhang on each side), has a fixed thickness and sits
//! `ground_bottom_offset` below the bottom edge. Platforms come from the level
//! and never move. A resize only ever replaces the ground body.

use glam::Vec2;

use crate::config::WorldConfig;
use crate::level::PlatformDef;
use crate::simulation::{BodyHandle, BodyOptions, BodyShape, Simulation};
use scroller_render::Camera2D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn is_valid(&self) -> bool {
        [self.width, self.height, self.pixel_ratio]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Backing-store size for the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderScale {
    pub physical_width: u32,
    pub physical_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSpan {
    pub center: Vec2,
    pub size: Vec2,
}

impl GroundSpan {
    pub fn left(&self) -> f32 {
        self.center.x - self.size.x * 0.5
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.size.x * 0.5
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.size.y * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// New size applied. `replaced_ground` is the released ground body, if the
    /// ground had to be rebuilt (pixel-ratio-only changes keep it).
    Applied { replaced_ground: Option<BodyHandle> },
    Unchanged,
}

pub struct ResizeAdapter {
    config: WorldConfig,
    viewport: ViewportSize,
    ground: BodyHandle,
    ground_span: GroundSpan,
    platforms: Vec<BodyHandle>,
}

impl ResizeAdapter {
    pub fn new<S: Simulation + ?Sized>(
        config: WorldConfig,
        platforms: &[PlatformDef],
        sim: &mut S,
    ) -> Result<Self, String> {
        let viewport = ViewportSize::new(
            config.viewport_width,
            config.viewport_height,
            config.pixel_ratio,
        );
        if !viewport.is_valid() {
            return Err(format!(
                "Initial viewport {}x{} @{} is invalid",
                viewport.width, viewport.height, viewport.pixel_ratio
            ));
        }

        let ground_span = ground_span_for(&config, viewport);
        let ground = spawn_static(sim, ground_span.center, ground_span.size);
        let platforms = platforms
            .iter()
            .map(|p| {
                log::debug!("Spawning platform '{}'", p.id);
                spawn_static(sim, Vec2::new(p.x, p.y), Vec2::new(p.width, p.height))
            })
            .collect();

        Ok(Self {
            config,
            viewport,
            ground,
            ground_span,
            platforms,
        })
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn ground(&self) -> BodyHandle {
        self.ground
    }

    pub fn ground_span(&self) -> GroundSpan {
        self.ground_span
    }

    pub fn platforms(&self) -> &[BodyHandle] {
        &self.platforms
    }

    /// Ground plus every platform.
    pub fn static_colliders(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        std::iter::once(self.ground).chain(self.platforms.iter().copied())
    }

    pub fn render_scale(&self) -> RenderScale {
        RenderScale {
            physical_width: (self.viewport.width * self.viewport.pixel_ratio).round() as u32,
            physical_height: (self.viewport.height * self.viewport.pixel_ratio).round() as u32,
        }
    }

    pub fn resize<S: Simulation + ?Sized>(
        &mut self,
        size: ViewportSize,
        sim: &mut S,
        camera: &mut Camera2D,
    ) -> Result<ResizeOutcome, String> {
        if !size.is_valid() {
            log::warn!(
                "Ignoring resize to {}x{} @{}; keeping {}x{}",
                size.width,
                size.height,
                size.pixel_ratio,
                self.viewport.width,
                self.viewport.height
            );
            return Err(format!(
                "Resize rejected: {}x{} @{} is not a positive size",
                size.width, size.height, size.pixel_ratio
            ));
        }
        if size == self.viewport {
            return Ok(ResizeOutcome::Unchanged);
        }

        let extent_changed = size.size() != self.viewport.size();
        self.viewport = size;

        let replaced_ground = if extent_changed {
            let span = ground_span_for(&self.config, size);
            let new_ground = spawn_static(sim, span.center, span.size);
            let old_ground = std::mem::replace(&mut self.ground, new_ground);
            sim.remove_from_world(old_ground);
            self.ground_span = span;
            camera.set_viewport(size.size());
            Some(old_ground)
        } else {
            None
        };

        log::info!(
            "Resized to {}x{} @{:.2} (ground {:.0}..{:.0})",
            size.width,
            size.height,
            size.pixel_ratio,
            self.ground_span.left(),
            self.ground_span.right()
        );
        Ok(ResizeOutcome::Applied { replaced_ground })
    }
}

fn ground_span_for(config: &WorldConfig, viewport: ViewportSize) -> GroundSpan {
    GroundSpan {
        center: Vec2::new(
            viewport.width * 0.5,
            viewport.height + config.ground_bottom_offset,
        ),
        size: Vec2::new(
            viewport.width + config.ground_overhang * 2.0,
            config.ground_thickness,
        ),
    }
}

fn spawn_static<S: Simulation + ?Sized>(sim: &mut S, center: Vec2, size: Vec2) -> BodyHandle {
    let handle = sim.create_body(
        BodyShape::Rectangle {
            width: size.x,
            height: size.y,
        },
        BodyOptions::fixed(center),
    );
    sim.add_to_world(handle);
    handle
}
