//! Math types for the engine, backed by the SIMD-accelerated `glam` crate.
//!
//! The renderer works in already-transformed caller space, so the only
//! heavy lifters here are [`Vec2`] and [`Vec3`]; the full `glam` surface
//! is re-exported for callers that need matrices or swizzles.
//!
//! # Examples
//!
//! ```
//! use veld_core::math::Vec2;
//!
//! let position = Vec2::new(10.0, 20.0);
//! let velocity = Vec2::new(1.0, 0.5);
//! let next = position + velocity * 0.016;
//! assert!(next.x > position.x);
//! ```

pub use glam::*;
