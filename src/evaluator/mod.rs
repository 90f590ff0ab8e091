//! Branch-condition evaluation.
//!
//! [`select_link`] picks the first satisfied `Condition` link in sort order;
//! [`operators`] holds the value-comparison primitives, replicating the
//! numeric/date coercion a storage engine would apply to the stored strings.

pub mod condition;
pub mod operators;

pub use condition::select_link;
