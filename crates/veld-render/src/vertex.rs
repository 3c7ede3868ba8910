//! Pod vertex formats and the layout descriptor the flusher binds with.
//!
//! Every depth-less primitive shares one interleaved format; which of its
//! attributes a draw actually sources is described by a [`VertexLayout`]
//! derived from the draw's state key, not by per-format vertex structs.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::color::Rgba;

/// Interleaved vertex for the depth-less path.
///
/// Unused attributes (texcoords for plain shapes, the second texcoord set
/// without an overlay) are left zeroed and simply not enabled at draw time.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub uv2: [f32; 2],
    pub color: Rgba,
}

/// Vertex for plain depth-bearing textured quads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DepthVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertex for depth-bearing tinted and dual-textured quads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
    pub uv2: [f32; 2],
    pub color: Rgba,
}

// These layouts are consumed by drivers as raw bytes; keep them dense.
const_assert_eq!(core::mem::size_of::<FlatVertex>(), 28);
const_assert_eq!(core::mem::size_of::<DepthVertex>(), 20);
const_assert_eq!(core::mem::size_of::<OverlayVertex>(), 32);

/// Describes which attribute arrays a draw sources from an interleaved
/// vertex buffer, and where they live inside the stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Position ordinates per vertex: 2, or 3 on the depth-bearing path.
    pub position_ordinates: u8,
    /// Enabled texcoord sets, 0–2. Set `i` is bound to texture unit `i`.
    pub texcoord_sets: u8,
    /// Whether the per-vertex color array is enabled. When disabled the
    /// driver samples a constant opaque white instead.
    pub has_color: bool,
    pub stride: u32,
    pub position_offset: u32,
    pub texcoord_offsets: [u32; 2],
    pub color_offset: u32,
}

impl VertexLayout {
    /// Depth-less layout over [`FlatVertex`] with the given enables.
    pub const fn flat(texcoord_sets: u8, has_color: bool) -> Self {
        Self {
            position_ordinates: 2,
            texcoord_sets,
            has_color,
            stride: core::mem::size_of::<FlatVertex>() as u32,
            position_offset: 0,
            texcoord_offsets: [8, 16],
            color_offset: 24,
        }
    }

    /// Layout over [`DepthVertex`].
    pub const fn depth() -> Self {
        Self {
            position_ordinates: 3,
            texcoord_sets: 1,
            has_color: false,
            stride: core::mem::size_of::<DepthVertex>() as u32,
            position_offset: 0,
            texcoord_offsets: [12, 0],
            color_offset: 0,
        }
    }

    /// Layout over [`OverlayVertex`] with both texcoord sets enabled.
    pub const fn overlay() -> Self {
        Self {
            position_ordinates: 3,
            texcoord_sets: 2,
            has_color: true,
            stride: core::mem::size_of::<OverlayVertex>() as u32,
            position_offset: 0,
            texcoord_offsets: [12, 20],
            color_offset: 28,
        }
    }

    /// Layout over [`OverlayVertex`] using only the primary texcoord set,
    /// used by the transparent depth sub-pass.
    pub const fn overlay_single_texture() -> Self {
        Self {
            texcoord_sets: 1,
            ..Self::overlay()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_stay_inside_stride() {
        for layout in [
            VertexLayout::flat(2, true),
            VertexLayout::depth(),
            VertexLayout::overlay(),
            VertexLayout::overlay_single_texture(),
        ] {
            assert!(layout.position_offset < layout.stride);
            for set in 0..layout.texcoord_sets as usize {
                assert!(layout.texcoord_offsets[set] + 8 <= layout.stride);
            }
            if layout.has_color {
                assert!(layout.color_offset + 4 <= layout.stride);
            }
        }
    }
}
