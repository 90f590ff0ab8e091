//! Routing-level error types.

use thiserror::Error;

/// Errors raised by routing operations.
///
/// Variants are specific so call sites and tests can match on them; the
/// coarse classification callers usually care about is [`EngineError::kind`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("flow not found: {0}")]
    FlowNotFound(u64),
    #[error("flow {0} is not published")]
    FlowNotPublished(u64),
    #[error("process node not found: {0}")]
    NodeNotFound(u64),
    #[error("flow {0} has no start transition")]
    NoStartTransition(u64),
    #[error("no outgoing transition at node {0}")]
    NoTransition(u64),
    #[error("transition condition not configured on link {0}")]
    ConditionNotConfigured(u64),
    #[error("condition references unknown field '{found}', node compares on '{expected}'")]
    UnknownConditionField { expected: String, found: String },
    #[error("no satisfying transition found at node {0}")]
    NoMatchingTransition(u64),
    #[error("flow {0} contains a transition cycle")]
    CyclicFlow(u64),
    #[error("actor {actor} has no pending task at node {process}, check assignment")]
    NotBound { actor: u64, process: u64 },
    #[error("no approver found for next step (node {0})")]
    NoAuditor(i64),
    #[error("entry not found: {0}")]
    EntryNotFound(u64),
    #[error("task {0} is not pending")]
    TaskNotPending(u64),
    #[error("resend allowed only on a rejected entry, entry {0} is not rejected")]
    NotRejected(u64),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse error taxonomy.
///
/// `Configuration`, `Authorization`, `Resolution` and `State` abort the
/// operation with no partial writes; `Storage` surfaces store failures and is
/// never retried by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authorization,
    Resolution,
    State,
    Storage,
}

impl EngineError {
    /// Classify this error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::FlowNotFound(_)
            | EngineError::FlowNotPublished(_)
            | EngineError::NodeNotFound(_)
            | EngineError::NoStartTransition(_)
            | EngineError::NoTransition(_)
            | EngineError::ConditionNotConfigured(_)
            | EngineError::UnknownConditionField { .. }
            | EngineError::NoMatchingTransition(_)
            | EngineError::CyclicFlow(_) => ErrorKind::Configuration,
            EngineError::NotBound { .. } => ErrorKind::Authorization,
            EngineError::NoAuditor(_) => ErrorKind::Resolution,
            EngineError::EntryNotFound(_)
            | EngineError::TaskNotPending(_)
            | EngineError::NotRejected(_) => ErrorKind::State,
            EngineError::Storage(_) => ErrorKind::Storage,
        }
    }
}
