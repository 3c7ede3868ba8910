//! The outbound seam towards the concrete graphics driver.
//!
//! The batching engine never talks to a GPU API directly; it issues the
//! calls below, already minimized by the [`StateCache`]. A production
//! binding forwards them to the driver, a test binding records them.
//!
//! Driver calls are fire-and-forget: a driver-side failure is the
//! binding's own diagnostic concern and must never feed back into the
//! engine, which stays safe to keep accumulating into.
//!
//! [`StateCache`]: crate::StateCache

use bitflags::bitflags;

use crate::color::Rgba;
use crate::types::{BlendMode, StencilParams, TextureId, Topology};
use crate::vertex::VertexLayout;

/// Number of texture units the engine mirrors. Only units 0 (primary)
/// and 1 (overlay) are currently bound by the flusher.
pub const MAX_TEXTURE_UNITS: usize = 4;

bitflags! {
    /// Set of enabled texture units.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextureUnits: u8 {
        const UNIT0 = 1 << 0;
        const UNIT1 = 1 << 1;
        const UNIT2 = 1 << 2;
        const UNIT3 = 1 << 3;
    }
}

impl TextureUnits {
    pub fn unit(index: u32) -> Self {
        Self::from_bits_truncate(1 << index)
    }
}

/// An offscreen surface draws can be redirected to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    /// Texture backing the target; also what gets re-submitted as a
    /// full-contents quad when attaching without discard.
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    /// Texture coordinates of the target's full contents, `[s0, t0, s1, t1]`.
    pub tex_coords: [f32; 4],
}

impl RenderTarget {
    pub fn new(texture: TextureId, width: u32, height: u32) -> Self {
        Self {
            texture,
            width,
            height,
            tex_coords: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

/// Low-level draw and state-change operations, one method per driver
/// state item the engine controls.
///
/// Implementations may assume calls arrive pre-deduplicated and on the
/// thread owning the graphics context.
pub trait GraphicsDriver {
    /// Bind `texture` at `unit`. The unit is already enabled.
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    fn enable_texture_unit(&mut self, unit: u32);
    fn disable_texture_unit(&mut self, unit: u32);

    fn set_blend(&mut self, blend: BlendMode);

    fn set_lighting(&mut self, enabled: bool);
    /// Diffuse color of the frame light; only meaningful while lighting
    /// is enabled.
    fn set_light_color(&mut self, r: f32, g: f32, b: f32);

    fn set_stencil(&mut self, params: StencilParams);
    fn disable_stencil(&mut self);
    fn clear_stencil(&mut self, value: u8);

    fn set_alpha_test(&mut self, reference: f32);
    fn disable_alpha_test(&mut self);

    fn set_depth_test(&mut self, enabled: bool);

    /// Configure the secondary texture-combine stage.
    fn set_overlay_stage(&mut self, kind: crate::types::OverlayKind);
    /// Constant color consumed by the overlay combine formulas.
    fn set_overlay_tint(&mut self, tint: Rgba);

    /// Toggle the per-vertex color array. While disabled the driver uses
    /// constant opaque white.
    fn set_color_array(&mut self, enabled: bool);

    /// Bind interleaved vertex data for subsequent draws. `data` lives at
    /// least until the next `bind_vertex_source` or the end of the flush.
    fn bind_vertex_source(&mut self, layout: VertexLayout, data: &[u8]);

    /// Rasterize `count` vertices starting at `first` in the currently
    /// bound source under the current state.
    fn draw(&mut self, topology: Topology, first: u32, count: u32);

    /// Redirect subsequent draws to `target`, or back to the backbuffer.
    fn set_render_target(&mut self, target: Option<&RenderTarget>);
    /// Clear color and depth of the active target.
    fn clear_target(&mut self);
}
