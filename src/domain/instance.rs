//! Instance model: one running [`Entry`] per submitted request, one [`Proc`]
//! task per approver per step per circle, and the submitted form values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmpId, EntryId, FlowId, ProcessId, TaskId};

/// Entry lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Completed,
    Rejected,
}

/// Task lifecycle status.
///
/// `AutoCompleted` marks a synthesized task at a start node that declared no
/// auditor; no one actually acted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Approved,
    AutoCompleted,
    Rejected,
}

/// One running instance of a flow.
///
/// `pid` links a child entry to the parent that spawned it (0 if top-level);
/// `child` holds the spawned child's current node while one is active;
/// `enter_process_id`/`enter_proc_id` record the parent node and task the
/// child was spawned from. Invariant: `(pid, circle)` identifies at most one
/// live child entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub flow_id: FlowId,
    pub emp_id: EmpId,
    pub title: String,
    /// Node the entry currently sits at.
    pub process_id: ProcessId,
    pub status: EntryStatus,
    /// Resend iteration counter, starts at 1.
    pub circle: u32,
    pub pid: EntryId,
    pub child: ProcessId,
    pub enter_process_id: ProcessId,
    pub enter_proc_id: TaskId,
}

impl Entry {
    pub fn has_parent(&self) -> bool {
        self.pid > 0
    }
}

/// One approver's unit of work at a node, for a given entry and circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proc {
    pub id: TaskId,
    pub entry_id: EntryId,
    pub flow_id: FlowId,
    pub process_id: ProcessId,
    pub process_name: String,
    /// Assigned approver.
    pub emp_id: EmpId,
    /// Who actually acted (set on close).
    pub auditor_id: EmpId,
    pub circle: u32,
    pub status: TaskStatus,
    /// Free-text decision comment.
    pub content: String,
    /// Serialized snapshot of the node's hook configuration, taken on close.
    pub hook_snapshot: Option<String>,
    pub created_at: DateTime<Utc>,
    pub acted_at: Option<DateTime<Utc>>,
}

/// A submitted field value, flattened to a comma-joined string for
/// multi-valued inputs. Created once at submission, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryData {
    pub entry_id: EntryId,
    pub flow_id: FlowId,
    pub field_name: String,
    pub field_value: String,
}

/// A form field handed to `submit`. Multi-valued inputs keep their values
/// separate here and are flattened when stored.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub values: Vec<String>,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Stored representation: values comma-joined.
    pub fn flattened(&self) -> String {
        self.values.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field_flattening() {
        assert_eq!(FormField::new("amount", "120").flattened(), "120");
        assert_eq!(
            FormField::multi("tags", vec!["a".into(), "b".into(), "c".into()]).flattened(),
            "a,b,c"
        );
    }

    #[test]
    fn test_has_parent() {
        let mut entry = Entry {
            id: 1,
            flow_id: 1,
            emp_id: 1,
            title: String::new(),
            process_id: 1,
            status: EntryStatus::Pending,
            circle: 1,
            pid: 0,
            child: 0,
            enter_process_id: 0,
            enter_proc_id: 0,
        };
        assert!(!entry.has_parent());
        entry.pid = 9;
        assert!(entry.has_parent());
    }
}
