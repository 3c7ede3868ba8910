//! Draw-object descriptors and the canonical batching key.

use crate::types::{BlendMode, Overlay, StencilParams, TextureId, Topology};
use crate::vertex::VertexLayout;

/// One queued draw: a primitive run plus everything needed to decide
/// whether it can share a driver submission with its neighbor.
///
/// Objects never own vertices; they describe a contiguous span appended
/// to the frame's shared pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderObject {
    pub topology: Topology,
    /// Number of vertices this object contributed to the pool.
    pub vertex_count: u32,
    pub texture: TextureId,
    pub overlay: Overlay,
    pub blend: BlendMode,
    pub lit: bool,
    pub stencil: Option<StencilParams>,
    /// Whether per-vertex color should be fed to the pipeline.
    pub has_color: bool,
}

impl RenderObject {
    /// A plain colored primitive with no texture.
    pub fn colored(topology: Topology, vertex_count: u32) -> Self {
        Self {
            topology,
            vertex_count,
            texture: TextureId::NONE,
            overlay: Overlay::None,
            blend: BlendMode::default(),
            lit: true,
            stencil: None,
            has_color: true,
        }
    }

    /// A textured primitive, color array off unless a tint is wanted.
    pub fn textured(topology: Topology, vertex_count: u32, texture: TextureId) -> Self {
        Self {
            topology,
            vertex_count,
            texture,
            overlay: Overlay::None,
            blend: BlendMode::default(),
            lit: true,
            stencil: None,
            has_color: false,
        }
    }

    /// The comparable state this object requires from the pipeline.
    ///
    /// Blend, lighting and stencil only discriminate batches when the
    /// frame actually runs a lighting model; without one they are all
    /// forced to the fixed defaults and comparing them would split
    /// batches for no visible difference.
    pub fn state_key(&self, lighting_enabled: bool) -> StateKey {
        StateKey {
            topology: self.topology,
            texture: self.texture,
            has_color: self.has_color,
            overlay: self.overlay,
            lit: if lighting_enabled {
                Some(LitKey {
                    blend: self.blend,
                    lit: self.lit,
                    stencil: self.stencil,
                })
            } else {
                None
            },
        }
    }
}

/// The lighting-dependent slice of a [`StateKey`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitKey {
    pub blend: BlendMode,
    pub lit: bool,
    pub stencil: Option<StencilParams>,
}

/// Canonical, wholly comparable pipeline state for one draw run.
///
/// Two adjacent objects merge exactly when their keys are equal and the
/// topology admits concatenation. All merge decisions go through key
/// equality; no field-by-field diffing anywhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateKey {
    pub topology: Topology,
    pub texture: TextureId,
    pub has_color: bool,
    pub overlay: Overlay,
    /// `Some` only when the frame runs a lighting model.
    pub lit: Option<LitKey>,
}

impl StateKey {
    /// The vertex attribute enables this state needs from the shared
    /// interleaved pool.
    pub fn layout(&self) -> VertexLayout {
        let texcoord_sets = if self.overlay.texture().is_some() {
            2
        } else if self.texture.is_some() {
            1
        } else {
            0
        };
        VertexLayout::flat(texcoord_sets, self.has_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighting_off_collapses_blend_differences() {
        let mut a = RenderObject::colored(Topology::Lines, 2);
        let mut b = a;
        b.blend = BlendMode {
            src: crate::types::BlendFactor::One,
            dst: crate::types::BlendFactor::One,
        };
        assert_eq!(a.state_key(false), b.state_key(false));
        assert_ne!(a.state_key(true), b.state_key(true));

        a.lit = false;
        assert_ne!(a.state_key(true), b.state_key(true));
    }

    #[test]
    fn key_layout_tracks_texture_presence() {
        let plain = RenderObject::colored(Topology::Quads, 4);
        assert_eq!(plain.state_key(false).layout().texcoord_sets, 0);

        let tex = RenderObject::textured(Topology::Quads, 4, TextureId(7));
        let layout = tex.state_key(false).layout();
        assert_eq!(layout.texcoord_sets, 1);
        assert!(!layout.has_color);
    }
}
