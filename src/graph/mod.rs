//! Flow-graph validation.
//!
//! Flow design itself lives in external tooling; [`validate_flow`] is the
//! check the engine-side runs before a flow is published.

pub mod validator;

pub use validator::validate_flow;
