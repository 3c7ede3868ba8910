//! Veld Core
//!
//! Engine-wide utilities shared by every Veld crate: logging setup,
//! profiling hooks and small math/geometry types.

pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
