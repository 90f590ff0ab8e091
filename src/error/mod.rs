//! Error types for the routing engine.
//!
//! - [`EngineError`]: all routing-level failures, one variant per condition.
//! - [`ErrorKind`]: coarse taxonomy used by callers to decide how to react.

pub mod engine_error;

pub use engine_error::{EngineError, ErrorKind};

/// Convenience alias for engine-level results.
pub type EngineResult<T> = Result<T, EngineError>;
