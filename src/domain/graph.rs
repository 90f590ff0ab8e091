//! Static graph model: flows, process nodes, transition links.
//!
//! This configuration is owned by external flow-design tooling; the engine
//! only reads it. A [`Flowlink`] is either a routing edge (`Condition`) or an
//! auditor declaration attached to a node (`Sys`/`Emp`/`Dept`).

use serde::{Deserialize, Serialize};

use super::condition::ConditionExpr;
use super::{DeptId, EmpId, FlowId, LinkId, ProcessId};

/// Sentinel for `Flowlink::next_process_id`: the edge leads out of the flow.
pub const TERMINAL: i64 = -1;

/// `Sys` auditor sentinel: the requester approves their own step.
pub const SYS_REQUESTER: i64 = -1000;
/// `Sys` auditor sentinel: the requester's department director.
pub const SYS_DIRECTOR: i64 = -1001;
/// `Sys` auditor sentinel: the requester's department manager.
pub const SYS_MANAGER: i64 = -1002;

/// A workflow template. Only published flows accept submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub is_publish: bool,
}

/// A step within a flow graph. `position == 0` marks the start node.
///
/// `child_flow_id > 0` spawns a nested sub-flow when the node is left;
/// `child_after` cascades completion back to the parent, and
/// `child_back_process` (when set) names the parent node the flow resumes at
/// once the child finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessNode {
    pub id: ProcessId,
    pub flow_id: FlowId,
    pub name: String,
    pub position: u32,
    #[serde(default)]
    pub child_flow_id: FlowId,
    #[serde(default)]
    pub child_after: bool,
    #[serde(default)]
    pub child_back_process: ProcessId,
    /// Field name branch conditions at this node compare on.
    #[serde(default)]
    pub expression_field: Option<String>,
}

/// Transition link kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Routing edge; defines advancement topology, may carry an expression.
    Condition,
    /// Symbolic auditor declaration (see the `SYS_*` sentinels).
    Sys,
    /// Explicit approver list, comma-joined employee ids.
    Emp,
    /// Department list, comma-joined; resolves to each department's director.
    Dept,
}

/// A directed connection out of a process node, or an auditor declaration
/// attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flowlink {
    pub id: LinkId,
    pub flow_id: FlowId,
    pub process_id: ProcessId,
    /// Target node for `Condition` links; [`TERMINAL`] ends the flow.
    pub next_process_id: i64,
    pub kind: LinkKind,
    /// Sentinel code or comma-joined id list, depending on `kind`.
    #[serde(default)]
    pub auditor: String,
    /// Branch predicate for `Condition` links; `None` means unconfigured.
    #[serde(default)]
    pub expression: Option<ConditionExpr>,
    /// Tie-break among condition links leaving the same node.
    #[serde(default)]
    pub sort: u32,
}

impl Flowlink {
    /// Parse the comma-joined `auditor` field as employee ids (`Emp` links).
    pub fn auditor_emp_ids(&self) -> Vec<EmpId> {
        parse_id_list(&self.auditor)
    }

    /// Parse the comma-joined `auditor` field as department ids (`Dept` links).
    pub fn auditor_dept_ids(&self) -> Vec<DeptId> {
        parse_id_list(&self.auditor)
    }

    /// Parse the `auditor` field as a `Sys` sentinel code.
    pub fn sys_code(&self) -> Option<i64> {
        self.auditor.trim().parse::<i64>().ok()
    }

    pub fn is_terminal(&self) -> bool {
        self.next_process_id == TERMINAL
    }
}

fn parse_id_list(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

/// Side-effect hook configuration bound to a process node.
///
/// The engine does not execute these; it snapshots them onto the closed task
/// so downstream consumers see what was configured at approval time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(kind: LinkKind, auditor: &str) -> Flowlink {
        Flowlink {
            id: 1,
            flow_id: 1,
            process_id: 1,
            next_process_id: 2,
            kind,
            auditor: auditor.to_string(),
            expression: None,
            sort: 0,
        }
    }

    #[test]
    fn test_auditor_id_list_parsing() {
        let l = link(LinkKind::Emp, "3, 5,8");
        assert_eq!(l.auditor_emp_ids(), vec![3, 5, 8]);

        let l = link(LinkKind::Emp, "");
        assert!(l.auditor_emp_ids().is_empty());

        let l = link(LinkKind::Dept, "12,notanid,7");
        assert_eq!(l.auditor_dept_ids(), vec![12, 7]);
    }

    #[test]
    fn test_sys_code() {
        let l = link(LinkKind::Sys, "-1001");
        assert_eq!(l.sys_code(), Some(SYS_DIRECTOR));
    }

    #[test]
    fn test_terminal_sentinel() {
        let mut l = link(LinkKind::Condition, "");
        assert!(!l.is_terminal());
        l.next_process_id = TERMINAL;
        assert!(l.is_terminal());
    }
}
