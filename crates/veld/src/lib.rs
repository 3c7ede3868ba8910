//! Veld - a batching 2D render engine
//!
//! Veld accumulates draw commands into per-frame pools and queues,
//! coalesces adjacent state-compatible primitives into single draws,
//! and forwards only real state changes to the graphics driver.
//!
//! # Quick Start
//!
//! ```ignore
//! use veld::prelude::*;
//!
//! let mut backend = RenderBackend::new(driver, Size::new(800, 600));
//!
//! backend.begin_frame();
//! let batch = backend.batch_mut();
//! batch.fill_rect(Vec2::new(10.0, 10.0), Vec2::new(90.0, 90.0), Rgba::RED);
//! batch.draw_circle(Vec2::new(50.0, 50.0), 30.0, 32, Rgba::WHITE);
//! backend.flush();
//! ```

pub use veld_core as core;

#[cfg(feature = "render")]
pub use veld_render as render;

pub mod prelude {
    pub use veld_core::geometry::{Rect, Size};
    pub use veld_core::math::*;

    #[cfg(feature = "render")]
    pub use veld_render::{
        BlendMode, FrameBatch, GraphicsDriver, Overlay, RenderBackend, RenderStats, RenderTarget,
        Rgba, StencilParams, TextureId, Topology,
    };
}
