//! In-memory store implementations.
//!
//! Used by the test suite and by embedders that keep flow configuration and
//! instances in process. Interior mutability via `parking_lot` locks; id
//! allocation is a simple counter per table.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{
    Dept, DeptId, Emp, EmpId, Entry, EntryData, EntryId, EntryStatus, Flow, FlowId, Flowlink,
    HookConfig, LinkKind, Proc, ProcessId, ProcessNode, TaskId, TaskStatus,
};
use crate::error::{EngineError, EngineResult};

use super::{Directory, FlowStore, InstanceStore, NewEntry, NewTask, TaskClose};

/// Flow configuration held in maps.
#[derive(Default)]
pub struct MemoryFlowStore {
    inner: RwLock<FlowTables>,
}

#[derive(Default)]
struct FlowTables {
    flows: HashMap<FlowId, Flow>,
    nodes: HashMap<ProcessId, ProcessNode>,
    links: Vec<Flowlink>,
    hooks: HashMap<ProcessId, Vec<HookConfig>>,
}

impl MemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_flow(&self, flow: Flow) {
        self.inner.write().flows.insert(flow.id, flow);
    }

    pub fn insert_node(&self, node: ProcessNode) {
        self.inner.write().nodes.insert(node.id, node);
    }

    pub fn insert_link(&self, link: Flowlink) {
        self.inner.write().links.push(link);
    }

    pub fn insert_hook(&self, process_id: ProcessId, hook: HookConfig) {
        self.inner.write().hooks.entry(process_id).or_default().push(hook);
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn flow(&self, id: FlowId) -> EngineResult<Option<Flow>> {
        Ok(self.inner.read().flows.get(&id).cloned())
    }

    async fn node(&self, id: ProcessId) -> EngineResult<Option<ProcessNode>> {
        Ok(self.inner.read().nodes.get(&id).cloned())
    }

    async fn links_from(&self, process_id: ProcessId) -> EngineResult<Vec<Flowlink>> {
        let inner = self.inner.read();
        let mut links: Vec<Flowlink> = inner
            .links
            .iter()
            .filter(|l| l.process_id == process_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.sort);
        Ok(links)
    }

    async fn start_link(&self, flow_id: FlowId) -> EngineResult<Option<Flowlink>> {
        let inner = self.inner.read();
        let mut candidates: Vec<&Flowlink> = inner
            .links
            .iter()
            .filter(|l| {
                l.flow_id == flow_id
                    && l.kind == LinkKind::Condition
                    && inner
                        .nodes
                        .get(&l.process_id)
                        .is_some_and(|n| n.position == 0)
            })
            .collect();
        candidates.sort_by_key(|l| l.sort);
        Ok(candidates.first().map(|l| (*l).clone()))
    }

    async fn node_hooks(&self, process_id: ProcessId) -> EngineResult<Vec<HookConfig>> {
        Ok(self
            .inner
            .read()
            .hooks
            .get(&process_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Entry/task/field rows held in maps.
#[derive(Default)]
pub struct MemoryInstanceStore {
    inner: RwLock<InstanceTables>,
}

#[derive(Default)]
struct InstanceTables {
    entries: HashMap<EntryId, Entry>,
    tasks: HashMap<TaskId, Proc>,
    data: Vec<EntryData>,
    next_entry_id: EntryId,
    next_task_id: TaskId,
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstanceStore for MemoryInstanceStore {
    async fn create_entry(&self, row: NewEntry) -> EngineResult<Entry> {
        let mut inner = self.inner.write();
        inner.next_entry_id += 1;
        let entry = Entry {
            id: inner.next_entry_id,
            flow_id: row.flow_id,
            emp_id: row.emp_id,
            title: row.title,
            process_id: row.process_id,
            status: EntryStatus::Pending,
            circle: row.circle,
            pid: row.pid,
            child: 0,
            enter_process_id: row.enter_process_id,
            enter_proc_id: row.enter_proc_id,
        };
        inner.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn entry(&self, id: EntryId) -> EngineResult<Option<Entry>> {
        Ok(self.inner.read().entries.get(&id).cloned())
    }

    async fn child_of(&self, pid: EntryId, circle: u32) -> EngineResult<Option<Entry>> {
        Ok(self
            .inner
            .read()
            .entries
            .values()
            .find(|e| e.pid == pid && e.circle == circle)
            .cloned())
    }

    async fn update_entry(&self, entry: &Entry) -> EngineResult<()> {
        let mut inner = self.inner.write();
        match inner.entries.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(EngineError::EntryNotFound(entry.id)),
        }
    }

    async fn create_task(&self, row: NewTask) -> EngineResult<Proc> {
        let mut inner = self.inner.write();
        inner.next_task_id += 1;
        let task = Proc {
            id: inner.next_task_id,
            entry_id: row.entry_id,
            flow_id: row.flow_id,
            process_id: row.process_id,
            process_name: row.process_name,
            emp_id: row.emp_id,
            auditor_id: if row.status == TaskStatus::AutoCompleted {
                row.emp_id
            } else {
                0
            },
            circle: row.circle,
            status: row.status,
            content: String::new(),
            hook_snapshot: None,
            created_at: Utc::now(),
            acted_at: None,
        };
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn pending_task(
        &self,
        process_id: ProcessId,
        emp_id: EmpId,
    ) -> EngineResult<Option<Proc>> {
        Ok(self
            .inner
            .read()
            .tasks
            .values()
            .filter(|t| {
                t.process_id == process_id
                    && t.emp_id == emp_id
                    && t.status == TaskStatus::Pending
            })
            .min_by_key(|t| t.id)
            .cloned())
    }

    async fn close_task(&self, task_id: TaskId, close: TaskClose) -> EngineResult<Proc> {
        let mut inner = self.inner.write();
        let task = inner
            .tasks
            .get_mut(&task_id)
            .ok_or(EngineError::TaskNotPending(task_id))?;
        // Compare-and-set: only a pending task may close.
        if task.status != TaskStatus::Pending {
            return Err(EngineError::TaskNotPending(task_id));
        }
        task.status = close.status;
        task.auditor_id = close.auditor_id;
        task.content = close.content;
        task.hook_snapshot = close.hook_snapshot;
        task.acted_at = Some(close.acted_at);
        Ok(task.clone())
    }

    async fn tasks_for_entry(&self, entry_id: EntryId) -> EngineResult<Vec<Proc>> {
        let mut tasks: Vec<Proc> = self
            .inner
            .read()
            .tasks
            .values()
            .filter(|t| t.entry_id == entry_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    async fn insert_entry_data(&self, rows: Vec<EntryData>) -> EngineResult<()> {
        self.inner.write().data.extend(rows);
        Ok(())
    }

    async fn entry_data(&self, entry_id: EntryId) -> EngineResult<Vec<EntryData>> {
        Ok(self
            .inner
            .read()
            .data
            .iter()
            .filter(|d| d.entry_id == entry_id)
            .cloned()
            .collect())
    }
}

/// Employee/department directory held in maps.
#[derive(Default)]
pub struct MemoryDirectory {
    emps: RwLock<HashMap<EmpId, Emp>>,
    depts: RwLock<HashMap<DeptId, Dept>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_emp(&self, emp: Emp) {
        self.emps.write().insert(emp.id, emp);
    }

    pub fn insert_dept(&self, dept: Dept) {
        self.depts.write().insert(dept.id, dept);
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn emp(&self, id: EmpId) -> EngineResult<Option<Emp>> {
        Ok(self.emps.read().get(&id).cloned())
    }

    async fn dept(&self, id: DeptId) -> EngineResult<Option<Dept>> {
        Ok(self.depts.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(flow_id: FlowId) -> NewEntry {
        NewEntry {
            flow_id,
            emp_id: 1,
            title: "t".into(),
            process_id: 1,
            circle: 1,
            pid: 0,
            enter_process_id: 0,
            enter_proc_id: 0,
        }
    }

    fn new_task(entry_id: EntryId, emp_id: EmpId) -> NewTask {
        NewTask {
            entry_id,
            flow_id: 1,
            process_id: 1,
            process_name: "step".into(),
            emp_id,
            circle: 1,
            status: TaskStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_entry_ids_are_dense() {
        let store = MemoryInstanceStore::new();
        let a = store.create_entry(new_entry(1)).await.unwrap();
        let b = store.create_entry(new_entry(1)).await.unwrap();
        assert_eq!(b.id, a.id + 1);
    }

    #[tokio::test]
    async fn test_close_task_is_compare_and_set() {
        let store = MemoryInstanceStore::new();
        let entry = store.create_entry(new_entry(1)).await.unwrap();
        let task = store.create_task(new_task(entry.id, 5)).await.unwrap();

        let close = TaskClose {
            status: TaskStatus::Approved,
            auditor_id: 5,
            content: "ok".into(),
            hook_snapshot: None,
            acted_at: Utc::now(),
        };
        store.close_task(task.id, close.clone()).await.unwrap();

        // Second close loses.
        let err = store.close_task(task.id, close).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskNotPending(_)));
    }

    #[tokio::test]
    async fn test_pending_task_filters_status_and_actor() {
        let store = MemoryInstanceStore::new();
        let entry = store.create_entry(new_entry(1)).await.unwrap();
        store.create_task(new_task(entry.id, 5)).await.unwrap();
        store.create_task(new_task(entry.id, 6)).await.unwrap();

        assert!(store.pending_task(1, 5).await.unwrap().is_some());
        assert!(store.pending_task(1, 7).await.unwrap().is_none());
        assert!(store.pending_task(2, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_link_requires_position_zero() {
        let flows = MemoryFlowStore::new();
        flows.insert_node(ProcessNode {
            id: 1,
            flow_id: 1,
            name: "start".into(),
            position: 0,
            child_flow_id: 0,
            child_after: false,
            child_back_process: 0,
            expression_field: None,
        });
        flows.insert_node(ProcessNode {
            id: 2,
            flow_id: 1,
            name: "review".into(),
            position: 1,
            child_flow_id: 0,
            child_after: false,
            child_back_process: 0,
            expression_field: None,
        });
        flows.insert_link(Flowlink {
            id: 1,
            flow_id: 1,
            process_id: 2,
            next_process_id: -1,
            kind: LinkKind::Condition,
            auditor: String::new(),
            expression: None,
            sort: 0,
        });
        flows.insert_link(Flowlink {
            id: 2,
            flow_id: 1,
            process_id: 1,
            next_process_id: 2,
            kind: LinkKind::Condition,
            auditor: String::new(),
            expression: None,
            sort: 1,
        });

        let start = flows.start_link(1).await.unwrap().unwrap();
        assert_eq!(start.id, 2);
        assert_eq!(start.process_id, 1);
    }

    #[tokio::test]
    async fn test_child_lookup_by_pid_and_circle() {
        let store = MemoryInstanceStore::new();
        let parent = store.create_entry(new_entry(1)).await.unwrap();
        let mut child_row = new_entry(2);
        child_row.pid = parent.id;
        child_row.circle = 1;
        let child = store.create_entry(child_row).await.unwrap();

        let found = store.child_of(parent.id, 1).await.unwrap().unwrap();
        assert_eq!(found.id, child.id);
        assert!(store.child_of(parent.id, 2).await.unwrap().is_none());
    }
}
