//! Veld Render
//!
//! Draw-command batching and graphics-state deduplication for the Veld
//! engine's 2D renderer. Primitives are accumulated into per-frame pools
//! and queues, coalesced into minimal driver call sequences at flush
//! time, and submitted through a [`GraphicsDriver`] binding behind a
//! change-only [`StateCache`].

pub mod backend;
pub mod color;
pub mod driver;
pub mod flush;
pub mod frame;
pub mod object;
pub mod pool;
pub mod state_cache;
pub mod types;
pub mod vertex;

pub use backend::{RenderBackend, TargetError};
pub use color::Rgba;
pub use driver::{GraphicsDriver, RenderTarget, TextureUnits, MAX_TEXTURE_UNITS};
pub use flush::{coalesce_runs, RenderStats, Run, ALPHA_TEST_REF};
pub use frame::{DepthBucket, FrameBatch, MAX_QUADS_PER_BUCKET};
pub use object::{LitKey, RenderObject, StateKey};
pub use pool::VertexPool;
pub use state_cache::StateCache;
pub use types::{
    BlendFactor, BlendMode, Overlay, OverlayKind, StencilFunc, StencilOp, StencilParams,
    TextureId, Topology,
};
pub use vertex::{DepthVertex, FlatVertex, OverlayVertex, VertexLayout};
