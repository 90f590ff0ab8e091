//! The routing engine.
//!
//! An [`Engine`] is an explicit instance constructed with injected stores and
//! directory (no globals), via [`Engine::builder`]. It exposes the three
//! operations the request layer drives routing with: [`Engine::submit`],
//! [`Engine::act`] and [`Engine::resend`]. Auditor resolution, branch
//! selection and sub-process handling all happen inside those calls.
//!
//! Concurrency: mutation is serialized per entry with an async mutex keyed by
//! entry id, and the store's `close_task` contract is compare-and-set on
//! pending status as a second guard, so of two simultaneous `act` calls on
//! the same task exactly one wins; the loser gets a state error.
//!
//! Each operation front-loads its lookups and validation so that resolution
//! and configuration failures surface before the first row is written; the
//! remaining writes can only fail at the store level.

mod resolver;
mod routing;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{EmpId, Entry, EntryData, EntryId, EntryStatus, FlowId, FormField, ProcessId};
use crate::error::{EngineError, EngineResult};
use crate::hub::NotificationHub;
use crate::store::{require_entry, Directory, FlowStore, InstanceStore, NewEntry};

/// An approver's decision on a pending task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// The routing engine. Cheap to share behind an `Arc`.
pub struct Engine {
    pub(crate) flows: Arc<dyn FlowStore>,
    pub(crate) instances: Arc<dyn InstanceStore>,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) hub: Arc<NotificationHub>,
    entry_locks: DashMap<EntryId, Arc<Mutex<()>>>,
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    flows: Arc<dyn FlowStore>,
    instances: Arc<dyn InstanceStore>,
    directory: Arc<dyn Directory>,
    hub: Option<Arc<NotificationHub>>,
}

impl EngineBuilder {
    /// Share a notification hub with external subscribers. A fresh hub is
    /// created otherwise.
    pub fn hub(mut self, hub: Arc<NotificationHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            flows: self.flows,
            instances: self.instances,
            directory: self.directory,
            hub: self.hub.unwrap_or_default(),
            entry_locks: DashMap::new(),
        }
    }
}

impl Engine {
    pub fn builder(
        flows: Arc<dyn FlowStore>,
        instances: Arc<dyn InstanceStore>,
        directory: Arc<dyn Directory>,
    ) -> EngineBuilder {
        EngineBuilder {
            flows,
            instances,
            directory,
            hub: None,
        }
    }

    /// The hub routing milestones are published to.
    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Create an entry for `flow_id`, store its form values, and run the
    /// initial transition. Returns the new entry's id.
    ///
    /// The initial transition is planned before the entry row is created;
    /// a submission that cannot resolve its first approver leaves nothing
    /// behind.
    pub async fn submit(
        &self,
        flow_id: FlowId,
        requester: EmpId,
        title: &str,
        fields: Vec<FormField>,
    ) -> EngineResult<EntryId> {
        let flow = self
            .flows
            .flow(flow_id)
            .await?
            .ok_or(EngineError::FlowNotFound(flow_id))?;
        if !flow.is_publish {
            return Err(EngineError::FlowNotPublished(flow_id));
        }
        let start = self
            .flows
            .start_link(flow_id)
            .await?
            .ok_or(EngineError::NoStartTransition(flow_id))?;
        let plan = self.plan_first_step(&start, requester).await?;

        let mut entry = self
            .instances
            .create_entry(NewEntry {
                flow_id,
                emp_id: requester,
                title: title.to_string(),
                process_id: start.process_id,
                circle: 1,
                pid: 0,
                enter_process_id: 0,
                enter_proc_id: 0,
            })
            .await?;

        let rows: Vec<EntryData> = fields
            .iter()
            .map(|f| EntryData {
                entry_id: entry.id,
                flow_id,
                field_name: f.name.clone(),
                field_value: f.flattened(),
            })
            .collect();
        self.instances.insert_entry_data(rows).await?;

        self.apply_first_step(&mut entry, &plan).await?;
        tracing::debug!(entry = entry.id, flow = flow_id, "entry submitted");
        Ok(entry.id)
    }

    /// Drive the caller's pending task at `process_id` to a decision.
    pub async fn act(
        &self,
        process_id: ProcessId,
        actor: EmpId,
        decision: Decision,
        comment: &str,
    ) -> EngineResult<()> {
        let task = self
            .instances
            .pending_task(process_id, actor)
            .await?
            .ok_or(EngineError::NotBound {
                actor,
                process: process_id,
            })?;

        let _guard = self.lock_entry(task.entry_id).await;

        // Re-read under the lock and pin to the task first seen; a racing
        // call may have closed it, and the actor may hold pending tasks at
        // this node for other entries whose locks we do not own.
        let task = self
            .instances
            .pending_task(process_id, actor)
            .await?
            .filter(|current| current.id == task.id)
            .ok_or(EngineError::TaskNotPending(task.id))?;
        let entry = require_entry(self.instances.entry(task.entry_id).await?, task.entry_id)?;
        let entry_id = entry.id;
        let parent_id = entry.has_parent().then_some(entry.pid);

        let result = match decision {
            Decision::Approve => self.transfer(entry, task, actor, comment).await,
            Decision::Reject => self.reject(entry, task, actor, comment).await,
        };

        if result.is_ok() {
            self.evict_closed_lock(entry_id).await;
            if let Some(pid) = parent_id {
                self.evict_closed_lock(pid).await;
            }
        }
        result
    }

    /// Re-submit a rejected entry as a fresh iteration. Prior circles' tasks
    /// are kept as history.
    pub async fn resend(&self, entry_id: EntryId) -> EngineResult<()> {
        let _guard = self.lock_entry(entry_id).await;

        let mut entry = require_entry(self.instances.entry(entry_id).await?, entry_id)?;
        if entry.status != EntryStatus::Rejected {
            return Err(EngineError::NotRejected(entry_id));
        }
        let flow = self
            .flows
            .flow(entry.flow_id)
            .await?
            .ok_or(EngineError::FlowNotFound(entry.flow_id))?;
        if !flow.is_publish {
            return Err(EngineError::FlowNotPublished(entry.flow_id));
        }
        let start = self
            .flows
            .start_link(entry.flow_id)
            .await?
            .ok_or(EngineError::NoStartTransition(entry.flow_id))?;

        // Plan before touching the row, so a failed resolution leaves the
        // entry rejected with its circle unchanged.
        let plan = self.plan_first_step(&start, entry.emp_id).await?;

        entry.circle += 1;
        entry.child = 0;
        entry.status = EntryStatus::Pending;
        self.apply_first_step(&mut entry, &plan).await?;
        tracing::debug!(entry = entry_id, circle = entry.circle, "entry resent");
        Ok(())
    }

    /// Serialize mutation per entry.
    async fn lock_entry(&self, entry_id: EntryId) -> OwnedMutexGuard<()> {
        let lock = self
            .entry_locks
            .entry(entry_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock slot for an entry that left the pending state. A later
    /// call on the same entry gets a fresh slot and then fails its state
    /// checks, so the map does not grow with closed entries.
    async fn evict_closed_lock(&self, entry_id: EntryId) {
        if let Ok(Some(entry)) = self.instances.entry(entry_id).await {
            if entry.status != EntryStatus::Pending {
                self.entry_locks.remove(&entry_id);
            }
        }
    }

    /// Fetch an entry that must exist (parent/child navigation).
    pub(crate) async fn require_entry(&self, id: EntryId) -> EngineResult<Entry> {
        require_entry(self.instances.entry(id).await?, id)
    }
}
