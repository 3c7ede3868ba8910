//! Test utilities for the Veld engine.
//!
//! Provides driver bindings for exercising the render engine without a
//! real graphics context:
//!
//! - `RecordingDriver` - records every driver call for verification
//!   (requires the `mock` feature)
//! - `NullDriver` - accepts and discards everything, for benchmarks
//!
//! Mock drivers use `parking_lot::Mutex` internally so call logs can be
//! inspected through a shared handle while the driver itself is owned
//! by the backend under test.

#[cfg(feature = "mock")]
pub mod mock_driver;

#[cfg(feature = "mock")]
pub use mock_driver::{CallLog, DriverCall, NullDriver, RecordingDriver};
