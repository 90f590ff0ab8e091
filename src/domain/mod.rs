//! Domain model: the static flow graph, running instances, the organization
//! directory, and the typed branch-condition language.

pub mod condition;
pub mod directory;
pub mod graph;
pub mod instance;

pub use condition::{CompareOp, ConditionExpr, Predicate};
pub use directory::{Dept, Emp};
pub use graph::{
    Flow, Flowlink, HookConfig, LinkKind, ProcessNode, SYS_DIRECTOR, SYS_MANAGER, SYS_REQUESTER,
    TERMINAL,
};
pub use instance::{Entry, EntryData, EntryStatus, FormField, Proc, TaskStatus};

/// Identifier aliases. All rows use dense integer ids handed out by the store.
pub type FlowId = u64;
pub type ProcessId = u64;
pub type LinkId = u64;
pub type EntryId = u64;
pub type TaskId = u64;
pub type EmpId = u64;
pub type DeptId = u64;
