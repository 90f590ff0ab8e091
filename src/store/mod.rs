//! Collaborator ports.
//!
//! The engine is constructed against these traits so embedders can plug in a
//! real database and tests can use the in-memory implementations in
//! [`memory`]. All mutation of entry/task/field rows goes through
//! [`InstanceStore`]; the graph side is read-only.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Dept, DeptId, Emp, EmpId, Entry, EntryData, EntryId, Flow, FlowId, Flowlink, HookConfig, Proc,
    ProcessId, ProcessNode, TaskId, TaskStatus,
};
use crate::error::EngineResult;

pub use memory::{MemoryDirectory, MemoryFlowStore, MemoryInstanceStore};

/// Read-only access to flow configuration.
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn flow(&self, id: FlowId) -> EngineResult<Option<Flow>>;

    async fn node(&self, id: ProcessId) -> EngineResult<Option<ProcessNode>>;

    /// All links attached to a node (routing edges and auditor declarations),
    /// condition links ordered by `sort`.
    async fn links_from(&self, process_id: ProcessId) -> EngineResult<Vec<Flowlink>>;

    /// The condition link leaving the flow's start node with the lowest
    /// `sort`, if any.
    async fn start_link(&self, flow_id: FlowId) -> EngineResult<Option<Flowlink>>;

    /// Side-effect hook configuration bound to a node.
    async fn node_hooks(&self, process_id: ProcessId) -> EngineResult<Vec<HookConfig>>;
}

/// Row template for creating an entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub flow_id: FlowId,
    pub emp_id: EmpId,
    pub title: String,
    pub process_id: ProcessId,
    pub circle: u32,
    pub pid: EntryId,
    pub enter_process_id: ProcessId,
    pub enter_proc_id: TaskId,
}

/// Row template for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub entry_id: EntryId,
    pub flow_id: FlowId,
    pub process_id: ProcessId,
    pub process_name: String,
    pub emp_id: EmpId,
    pub circle: u32,
    pub status: TaskStatus,
}

/// Fields written when a pending task is closed.
#[derive(Debug, Clone)]
pub struct TaskClose {
    pub status: TaskStatus,
    pub auditor_id: EmpId,
    pub content: String,
    pub hook_snapshot: Option<String>,
    pub acted_at: DateTime<Utc>,
}

/// Transactional store for entries, tasks and submitted field values.
///
/// `close_task` is compare-and-set on pending status: closing a task that is
/// no longer pending must fail with [`crate::error::EngineError::TaskNotPending`].
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn create_entry(&self, row: NewEntry) -> EngineResult<Entry>;

    async fn entry(&self, id: EntryId) -> EngineResult<Option<Entry>>;

    /// The live child entry spawned by `pid` in the given circle, if any.
    async fn child_of(&self, pid: EntryId, circle: u32) -> EngineResult<Option<Entry>>;

    async fn update_entry(&self, entry: &Entry) -> EngineResult<()>;

    async fn create_task(&self, row: NewTask) -> EngineResult<Proc>;

    /// The actor's pending task at a node, if any.
    async fn pending_task(
        &self,
        process_id: ProcessId,
        emp_id: EmpId,
    ) -> EngineResult<Option<Proc>>;

    async fn close_task(&self, task_id: TaskId, close: TaskClose) -> EngineResult<Proc>;

    async fn tasks_for_entry(&self, entry_id: EntryId) -> EngineResult<Vec<Proc>>;

    async fn insert_entry_data(&self, rows: Vec<EntryData>) -> EngineResult<()>;

    async fn entry_data(&self, entry_id: EntryId) -> EngineResult<Vec<EntryData>>;
}

/// Identity and department lookup for `Sys`/`Dept` resolution.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn emp(&self, id: EmpId) -> EngineResult<Option<Emp>>;

    async fn dept(&self, id: DeptId) -> EngineResult<Option<Dept>>;
}

/// Helper used by engine code paths that need an entry to exist.
pub(crate) fn require_entry(entry: Option<Entry>, id: EntryId) -> EngineResult<Entry> {
    entry.ok_or(crate::error::EngineError::EntryNotFound(id))
}
