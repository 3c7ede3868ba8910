//! Core enums shared by the accumulation API, the draw-object queue and
//! the batch flusher.

use crate::color::Rgba;

/// Opaque handle to a driver-side texture.
///
/// The value `0` means "no texture" and is exposed as [`TextureId::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

/// How a vertex range is interpreted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

impl Topology {
    /// Whether two adjacent ranges of this topology may be drawn as one.
    ///
    /// Concatenating strips, fans or loops would visually join unrelated
    /// shapes, so those always flush as their own draw.
    pub fn is_mergeable(self) -> bool {
        !matches!(
            self,
            Topology::LineStrip | Topology::LineLoop | Topology::TriangleStrip | Topology::TriangleFan
        )
    }
}

/// Symbolic blend factor, covering both source and destination positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// A source/destination blend factor pair.
///
/// Blend factors only participate in batching decisions while the frame's
/// lighting model is enabled; see [`RenderObject::state_key`].
///
/// [`RenderObject::state_key`]: crate::RenderObject::state_key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendMode {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Default for BlendMode {
    fn default() -> Self {
        Self {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

/// Stencil operation applied when both tests pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    Invert,
}

/// Stencil comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilFunc {
    Never,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Always,
}

/// Full stencil configuration for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilParams {
    pub ref_value: u8,
    pub op: StencilOp,
    pub func: StencilFunc,
}

impl StencilParams {
    /// Unconditional write of `ref_value`, used for the solo depth pass.
    pub const fn write(ref_value: u8) -> Self {
        Self {
            ref_value,
            op: StencilOp::Replace,
            func: StencilFunc::Always,
        }
    }
}

/// Discriminant of an [`Overlay`], selecting the texture-combine formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayKind {
    #[default]
    None,
    /// Interpolate the primary texture towards a constant color.
    Tint,
    /// Interpolate the primary texture towards a second texture, then tint.
    TintedTexture,
    /// Cross-fade primary and secondary texture by the tint's alpha.
    TextureBlend,
}

/// Secondary color/texture layer combined with the primary texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overlay {
    #[default]
    None,
    Tint(Rgba),
    TintedTexture { texture: TextureId, tint: Rgba },
    TextureBlend { texture: TextureId, tint: Rgba },
}

impl Overlay {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::None => OverlayKind::None,
            Overlay::Tint(_) => OverlayKind::Tint,
            Overlay::TintedTexture { .. } => OverlayKind::TintedTexture,
            Overlay::TextureBlend { .. } => OverlayKind::TextureBlend,
        }
    }

    /// The secondary texture, if this overlay kind uses one.
    pub fn texture(&self) -> TextureId {
        match self {
            Overlay::TintedTexture { texture, .. } | Overlay::TextureBlend { texture, .. } => *texture,
            _ => TextureId::NONE,
        }
    }

    /// The overlay tint color, white for `None`.
    pub fn tint(&self) -> Rgba {
        match self {
            Overlay::None => Rgba::WHITE,
            Overlay::Tint(tint)
            | Overlay::TintedTexture { tint, .. }
            | Overlay::TextureBlend { tint, .. } => *tint,
        }
    }

    /// An overlay kind that requires a texture but has none bound degrades
    /// to no overlay.
    pub fn normalized(self) -> Overlay {
        match self {
            Overlay::TintedTexture { texture, .. } | Overlay::TextureBlend { texture, .. }
                if texture.is_none() =>
            {
                Overlay::None
            }
            other => other,
        }
    }
}
