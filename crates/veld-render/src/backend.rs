//! The renderer facade: owns the frame batch, the state cache and the
//! active render target.

use std::fmt;

use glam::Vec2;
use veld_core::geometry::{Rect, Size};

use crate::driver::{GraphicsDriver, RenderTarget};
use crate::flush::{self, RenderStats};
use crate::frame::FrameBatch;
use crate::state_cache::StateCache;

/// Errors from render-target redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    /// `detach_target` was called with no target attached.
    NotAttached,
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::NotAttached => write!(f, "no render target is attached"),
        }
    }
}

impl std::error::Error for TargetError {}

/// One renderer instance: accumulation, deduplicated state and flushing
/// behind a single entry point. All frame context lives here; nothing
/// is process-global.
pub struct RenderBackend<D> {
    batch: FrameBatch,
    cache: StateCache<D>,
    /// Frame lighting model; `0` disables lighting and removes blend,
    /// lighting and stencil from batching decisions.
    lighting_model: u32,
    target: Option<RenderTarget>,
    backbuffer: Size<u32>,
    last_stats: RenderStats,
}

impl<D: GraphicsDriver> RenderBackend<D> {
    pub fn new(driver: D, backbuffer: Size<u32>) -> Self {
        Self {
            batch: FrameBatch::new(),
            cache: StateCache::new(driver),
            lighting_model: 0,
            target: None,
            backbuffer,
            last_stats: RenderStats::default(),
        }
    }

    /// The accumulation surface for this frame.
    pub fn batch(&self) -> &FrameBatch {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut FrameBatch {
        &mut self.batch
    }

    pub fn driver(&self) -> &D {
        self.cache.driver()
    }

    pub fn driver_mut(&mut self) -> &mut D {
        self.cache.driver_mut()
    }

    /// Counters from the most recent flush.
    pub fn stats(&self) -> RenderStats {
        self.last_stats
    }

    fn lighting_enabled(&self) -> bool {
        self.lighting_model != 0
    }

    /// Start a new frame. Leftover accumulation indicates a missed
    /// flush; it is dropped rather than drawn a frame late.
    pub fn begin_frame(&mut self) {
        if !self.batch.is_empty() {
            tracing::warn!("frame batch not empty at frame start, dropping stale work");
            self.batch.clear();
        }
    }

    /// Submit all accumulated work to the driver.
    pub fn flush(&mut self) {
        let lighting = self.lighting_enabled();
        self.last_stats = flush::flush(&mut self.batch, &mut self.cache, lighting);
    }

    // ---- lighting ----

    pub fn set_lighting_model(&mut self, model: u32) {
        self.lighting_model = model;
    }

    pub fn lighting_model(&self) -> u32 {
        self.lighting_model
    }

    /// Set the frame light's diffuse color. Ignored while no lighting
    /// model is active.
    pub fn set_lighting(&mut self, r: f32, g: f32, b: f32) {
        if self.lighting_enabled() {
            self.cache.set_light_color(r, g, b);
        }
    }

    /// Return lighting to neutral white and drop the mirrored color so
    /// the next `set_lighting` is forwarded unconditionally.
    pub fn reset_lighting(&mut self) {
        if self.lighting_enabled() {
            self.cache.set_light_color(1.0, 1.0, 1.0);
            self.cache.invalidate_lighting();
        }
    }

    // ---- stencil ----

    pub fn clear_stencil(&mut self, value: u8) {
        self.cache.clear_stencil(value);
    }

    // ---- pixels ----

    /// Queue a single pixel write. Returns `false` (and queues nothing)
    /// if the coordinate lies outside the active target.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: crate::Rgba) -> bool {
        if !self.target_area().contains(x, y) {
            return false;
        }
        self.batch.put_pixel(x as f32, y as f32, color);
        true
    }

    // ---- render targets ----

    /// Dimensions of the surface currently being drawn to.
    pub fn target_size(&self) -> Size<u32> {
        match &self.target {
            Some(target) => Size::new(target.width, target.height),
            None => self.backbuffer,
        }
    }

    /// Pixel area of the surface currently being drawn to.
    pub fn target_area(&self) -> Rect<i32> {
        let size = self.target_size();
        Rect::new(0, 0, size.width as i32, size.height as i32)
    }

    pub fn backbuffer_size(&self) -> Size<u32> {
        self.backbuffer
    }

    /// Resize the backbuffer mirror after a window resize.
    pub fn set_backbuffer_size(&mut self, size: Size<u32>) {
        self.backbuffer = size;
    }

    /// Redirect subsequent depth-less draws to `target`.
    ///
    /// Everything queued against the old surface, depth-bearing work
    /// included, is flushed first. With `discard` the target starts
    /// cleared; without it the target's current contents are
    /// re-submitted as a full-surface quad so later draws layer on top
    /// of them.
    pub fn attach_target(&mut self, target: RenderTarget, discard: bool) {
        self.flush();
        self.target = Some(target);
        self.cache.set_render_target(Some(&target));
        if discard {
            self.cache.clear_target();
        } else {
            self.batch.textured_quad(
                Vec2::ZERO,
                Vec2::new(target.width as f32, target.height as f32),
                target.texture,
                target.tex_coords,
                255,
            );
            self.flush_flat();
        }
    }

    /// Flush everything queued against the attached target and restore
    /// the backbuffer.
    pub fn detach_target(&mut self) -> Result<(), TargetError> {
        if self.target.is_none() {
            return Err(TargetError::NotAttached);
        }
        self.flush();
        self.target = None;
        self.cache.set_render_target(None);
        Ok(())
    }

    fn flush_flat(&mut self) {
        let lighting = self.lighting_enabled();
        self.last_stats = flush::flush_flat_only(&mut self.batch, &mut self.cache, lighting);
    }
}
