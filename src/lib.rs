//! # approvalflow: approval-request routing engine
//!
//! `approvalflow` routes a business approval request through a configurable
//! directed graph of steps: it resolves who must act at each step, fans out
//! parallel approval tasks, evaluates branch conditions against submitted
//! form data, spawns and joins nested sub-processes, and advances or
//! terminates the request.
//!
//! - **Graph model**: flows, process nodes, and typed transition links
//!   (routing edges vs. `Sys`/`Emp`/`Dept` auditor declarations).
//! - **Instance model**: one entry per request, one task per approver per
//!   step per resend circle, immutable submitted field values.
//! - **Auditor resolution**: sentinel codes (requester, department director,
//!   department manager), explicit approver lists, department directors.
//! - **Branch conditions**: a typed predicate language evaluated in-process
//!   with numeric/date coercion, never query-text concatenation.
//! - **Sub-processes**: a node can spawn a child flow; the parent resumes or
//!   cascade-completes when the child finishes.
//! - **Notification hub**: routing milestones published to registered
//!   subscribers after the mutation commits, best-effort.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use approvalflow::engine::{Decision, Engine};
//! use approvalflow::domain::FormField;
//! use approvalflow::store::{MemoryDirectory, MemoryFlowStore, MemoryInstanceStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flows = Arc::new(MemoryFlowStore::new());
//!     let instances = Arc::new(MemoryInstanceStore::new());
//!     let directory = Arc::new(MemoryDirectory::new());
//!     // ... load flow configuration and staff into the stores ...
//!
//!     let engine = Engine::builder(flows, instances, directory).build();
//!     let entry = engine
//!         .submit(1, 42, "expense claim", vec![FormField::new("amount", "120")])
//!         .await?;
//!     engine.act(2, 7, Decision::Approve, "looks good").await?;
//!     let _ = entry;
//!     Ok(())
//! }
//! ```
//!
//! The engine is storage-agnostic: implement [`store::FlowStore`],
//! [`store::InstanceStore`] and [`store::Directory`] against a database, or
//! use the bundled in-memory stores.

pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod hub;
pub mod store;

pub use engine::{Decision, Engine, EngineBuilder};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use hub::{EventKind, NotificationHub};
