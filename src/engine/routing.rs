//! Step advancement: initial transition, transfer, sub-process spawn/join,
//! rejection.

use chrono::Utc;

use crate::domain::{
    EmpId, Entry, EntryStatus, Flowlink, LinkKind, Proc, ProcessId, ProcessNode, TaskStatus,
};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::select_link;
use crate::hub::EventKind;
use crate::store::{NewTask, TaskClose};

use super::Engine;

/// Fully resolved initial transition, computed before any row is written.
pub(crate) struct FirstStep {
    /// Start node to auto-complete for the requester, when it declares no
    /// auditor of its own.
    auto_node: Option<ProcessNode>,
    /// Node the first pending tasks are created at.
    assign_node: ProcessNode,
    auditors: Vec<EmpId>,
}

impl Engine {
    /// Resolve the initial transition for a flow, read-only.
    ///
    /// A start node with no auditor declaration is auto-completed and
    /// assignment moves straight to the next node; otherwise the start
    /// node's own auditors are assigned. An empty resolved set is fatal,
    /// and surfaces here, before the caller has written anything.
    pub(crate) async fn plan_first_step(
        &self,
        start: &Flowlink,
        requester: EmpId,
    ) -> EngineResult<FirstStep> {
        let links = self.flows.links_from(start.process_id).await?;
        let has_auditor_link = links.iter().any(|l| l.kind != LinkKind::Condition);

        let (auto_node, assign_at): (Option<ProcessNode>, ProcessId) = if has_auditor_link {
            (None, start.process_id)
        } else {
            if start.is_terminal() {
                return Err(EngineError::NoAuditor(start.next_process_id));
            }
            let node = self.node(start.process_id).await?;
            (Some(node), start.next_process_id as ProcessId)
        };

        let auditors = self.resolve_auditors(requester, assign_at).await?;
        if auditors.is_empty() {
            return Err(EngineError::NoAuditor(assign_at as i64));
        }
        let assign_node = self.node(assign_at).await?;

        Ok(FirstStep {
            auto_node,
            assign_node,
            auditors,
        })
    }

    /// Write the task rows a planned initial transition calls for and move
    /// the entry to the assignment node.
    pub(crate) async fn apply_first_step(
        &self,
        entry: &mut Entry,
        plan: &FirstStep,
    ) -> EngineResult<()> {
        if let Some(node) = &plan.auto_node {
            // Synthesized start task, attributed to the requester.
            self.instances
                .create_task(NewTask {
                    entry_id: entry.id,
                    flow_id: entry.flow_id,
                    process_id: node.id,
                    process_name: node.name.clone(),
                    emp_id: entry.emp_id,
                    circle: entry.circle,
                    status: TaskStatus::AutoCompleted,
                })
                .await?;
        }

        let tasks = self
            .create_pending_tasks(entry, &plan.assign_node, &plan.auditors)
            .await?;
        entry.process_id = plan.assign_node.id;
        self.instances.update_entry(entry).await?;

        for task in &tasks {
            self.hub.invoke(EventKind::AuditorAssigned, task.emp_id);
        }
        Ok(())
    }

    /// Advance the entry after `actor` approves their pending task.
    pub(crate) async fn transfer(
        &self,
        mut entry: Entry,
        task: Proc,
        actor: EmpId,
        comment: &str,
    ) -> EngineResult<()> {
        let node = self.node(task.process_id).await?;
        let cond_links: Vec<Flowlink> = self
            .flows
            .links_from(task.process_id)
            .await?
            .into_iter()
            .filter(|l| l.kind == LinkKind::Condition)
            .collect();
        // Branch evaluation only when the node actually branches.
        let chosen: Flowlink = if cond_links.len() > 1 {
            let rows = self.instances.entry_data(entry.id).await?;
            select_link(&cond_links, node.expression_field.as_deref(), &rows)?.clone()
        } else {
            match cond_links.into_iter().next() {
                Some(link) => link,
                None => return Err(EngineError::NoTransition(task.process_id)),
            }
        };

        if node.child_flow_id > 0 {
            self.spawn_child(&mut entry, &task, &node).await?;
        } else if chosen.is_terminal() {
            self.complete_entry(&mut entry).await?;
        } else {
            let next = chosen.next_process_id as ProcessId;
            let auditors = self.resolve_auditors(entry.emp_id, next).await?;
            if auditors.is_empty() {
                return Err(EngineError::NoAuditor(chosen.next_process_id));
            }
            let next_node = self.node(next).await?;
            let tasks = self
                .create_pending_tasks(&entry, &next_node, &auditors)
                .await?;
            entry.process_id = next;
            self.instances.update_entry(&entry).await?;
            for created in &tasks {
                self.hub.invoke(EventKind::AuditorAssigned, created.emp_id);
            }
        }

        self.close_task(&task, actor, TaskStatus::Approved, comment, true)
            .await?;
        tracing::debug!(
            entry = entry.id,
            node = task.process_id,
            actor,
            "step approved"
        );

        self.hub.invoke(EventKind::StepExecuted, entry.id);
        Ok(())
    }

    /// Reject the caller's pending task and terminate the entry, cascading
    /// one level up to a waiting parent.
    pub(crate) async fn reject(
        &self,
        mut entry: Entry,
        task: Proc,
        actor: EmpId,
        comment: &str,
    ) -> EngineResult<()> {
        self.close_task(&task, actor, TaskStatus::Rejected, comment, false)
            .await?;

        entry.status = EntryStatus::Rejected;
        self.instances.update_entry(&entry).await?;

        if entry.has_parent() {
            let mut parent = self.require_entry(entry.pid).await?;
            parent.status = EntryStatus::Rejected;
            parent.child = 0;
            self.instances.update_entry(&parent).await?;
        }

        tracing::debug!(entry = entry.id, node = task.process_id, actor, "step rejected");
        self.hub.invoke(EventKind::RequesterNotified, entry.emp_id);
        Ok(())
    }

    /// Locate or create the child entry for a child-flow node, idempotent on
    /// `(pid, circle)`. The child's initial transition is fully resolved
    /// before the child row is created, so a failed resolution leaves no
    /// stray child behind. The parent does not advance; it resumes when the
    /// child completes.
    async fn spawn_child(
        &self,
        entry: &mut Entry,
        task: &Proc,
        node: &ProcessNode,
    ) -> EngineResult<()> {
        let child_start = self
            .flows
            .start_link(node.child_flow_id)
            .await?
            .ok_or(EngineError::NoStartTransition(node.child_flow_id))?;

        let existing = self.instances.child_of(entry.id, entry.circle).await?;
        let child = match existing {
            Some(child) => child,
            None => {
                let plan = self.plan_first_step(&child_start, entry.emp_id).await?;
                let mut child = self
                    .instances
                    .create_entry(crate::store::NewEntry {
                        flow_id: node.child_flow_id,
                        emp_id: entry.emp_id,
                        title: entry.title.clone(),
                        process_id: child_start.process_id,
                        circle: entry.circle,
                        pid: entry.id,
                        enter_process_id: node.id,
                        enter_proc_id: task.id,
                    })
                    .await?;
                self.apply_first_step(&mut child, &plan).await?;
                tracing::debug!(
                    parent = entry.id,
                    child = child.id,
                    flow = node.child_flow_id,
                    "child flow spawned"
                );
                child
            }
        };

        entry.child = child.process_id;
        self.instances.update_entry(entry).await?;
        Ok(())
    }

    /// Terminal edge taken: complete this entry and, for a child, resume or
    /// cascade-complete the parent.
    async fn complete_entry(&self, entry: &mut Entry) -> EngineResult<()> {
        entry.status = EntryStatus::Completed;
        self.instances.update_entry(entry).await?;

        if !entry.has_parent() {
            self.hub.invoke(EventKind::RequesterNotified, entry.emp_id);
            return Ok(());
        }

        let mut parent = self.require_entry(entry.pid).await?;
        let enter_node = self.node(entry.enter_process_id).await?;

        if enter_node.child_after {
            // Child completion ends the parent too.
            parent.status = EntryStatus::Completed;
            parent.child = 0;
            self.instances.update_entry(&parent).await?;
            self.hub.invoke(EventKind::RequesterNotified, parent.emp_id);
            return Ok(());
        }

        if enter_node.child_back_process > 0 {
            // Resume the parent at its configured return node.
            let back = enter_node.child_back_process;
            self.goto_process(&parent, back).await?;
            parent.process_id = back;
            parent.status = EntryStatus::Pending;
            parent.child = 0;
            self.instances.update_entry(&parent).await?;
            return Ok(());
        }

        // Default: the parent's own next edge after the spawning node.
        let parent_next = self
            .flows
            .links_from(entry.enter_process_id)
            .await?
            .into_iter()
            .filter(|l| l.kind == LinkKind::Condition)
            .min_by_key(|l| l.sort)
            .ok_or(EngineError::NoTransition(entry.enter_process_id))?;

        if parent_next.is_terminal() {
            parent.status = EntryStatus::Completed;
            parent.child = 0;
            self.instances.update_entry(&parent).await?;
            self.hub.invoke(EventKind::RequesterNotified, parent.emp_id);
        } else {
            let next = parent_next.next_process_id as ProcessId;
            self.goto_process(&parent, next).await?;
            parent.process_id = next;
            parent.status = EntryStatus::Pending;
            parent.child = 0;
            self.instances.update_entry(&parent).await?;
        }
        Ok(())
    }

    /// Assign `process_id`'s auditors to `entry` without touching the entry
    /// row; callers update `process_id`/`status` themselves.
    async fn goto_process(&self, entry: &Entry, process_id: ProcessId) -> EngineResult<()> {
        let auditors = self.resolve_auditors(entry.emp_id, process_id).await?;
        if auditors.is_empty() {
            return Err(EngineError::NoAuditor(process_id as i64));
        }
        let node = self.node(process_id).await?;
        let tasks = self.create_pending_tasks(entry, &node, &auditors).await?;
        for task in &tasks {
            self.hub.invoke(EventKind::AuditorAssigned, task.emp_id);
        }
        Ok(())
    }

    /// One pending task per auditor at `node`.
    async fn create_pending_tasks(
        &self,
        entry: &Entry,
        node: &ProcessNode,
        auditors: &[EmpId],
    ) -> EngineResult<Vec<Proc>> {
        let mut tasks = Vec::with_capacity(auditors.len());
        for auditor in auditors {
            let task = self
                .instances
                .create_task(NewTask {
                    entry_id: entry.id,
                    flow_id: entry.flow_id,
                    process_id: node.id,
                    process_name: node.name.clone(),
                    emp_id: *auditor,
                    circle: entry.circle,
                    status: TaskStatus::Pending,
                })
                .await?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Close the caller's task. On approval the node's hook configuration is
    /// snapshotted onto the closed row.
    async fn close_task(
        &self,
        task: &Proc,
        actor: EmpId,
        status: TaskStatus,
        comment: &str,
        snapshot_hooks: bool,
    ) -> EngineResult<Proc> {
        let hook_snapshot = if snapshot_hooks {
            let hooks = self.flows.node_hooks(task.process_id).await?;
            if hooks.is_empty() {
                None
            } else {
                Some(
                    serde_json::to_string(&hooks)
                        .map_err(|e| EngineError::Storage(e.to_string()))?,
                )
            }
        } else {
            None
        };

        self.instances
            .close_task(
                task.id,
                TaskClose {
                    status,
                    auditor_id: actor,
                    content: comment.to_string(),
                    hook_snapshot,
                    acted_at: Utc::now(),
                },
            )
            .await
    }

    /// A node that must exist in flow configuration.
    async fn node(&self, process_id: ProcessId) -> EngineResult<ProcessNode> {
        self.flows
            .node(process_id)
            .await?
            .ok_or(EngineError::NodeNotFound(process_id))
    }
}
