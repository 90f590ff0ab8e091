//! Notification hub: typed event registry decoupling routing from side
//! effects (messaging, audit logging).
//!
//! Handlers are plain `Fn(u64)` callbacks keyed by [`EventKind`]; signature
//! checking happens at registration time through the type system. Dispatch
//! clones the handler list under the registry lock and invokes it unlocked,
//! so a slow or re-registering handler never blocks concurrent registration.
//! A panicking handler is caught and logged; it aborts neither its siblings
//! nor the routing operation that fired the event.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

/// Routing milestones subscribers can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Fired once per newly created pending task; subject is the assigned
    /// approver's employee id.
    AuditorAssigned,
    /// Fired on completion or rejection; subject is the requester's
    /// employee id.
    RequesterNotified,
    /// Fired after every committed routing step; subject is the entry id.
    StepExecuted,
}

/// A registered subscriber.
pub type EventHandler = Arc<dyn Fn(u64) + Send + Sync>;

/// Registry of event subscribers.
#[derive(Default)]
pub struct NotificationHub {
    handlers: Mutex<HashMap<EventKind, Vec<EventHandler>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler. Handlers for the same event run sequentially in
    /// registration order.
    pub fn register<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Remove all handlers for an event.
    pub fn clear(&self, kind: EventKind) {
        self.handlers.lock().remove(&kind);
    }

    /// Invoke all handlers for an event, best-effort.
    ///
    /// The registry lock is released before any handler runs.
    pub fn invoke(&self, kind: EventKind, subject_id: u64) {
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.lock();
            match handlers.get(&kind) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for (index, handler) in snapshot.iter().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| handler(subject_id)));
            if result.is_err() {
                tracing::warn!(
                    event = ?kind,
                    handler = index,
                    subject = subject_id,
                    "notification handler panicked; continuing with remaining handlers"
                );
            }
        }
    }

    /// Number of handlers registered for an event.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.lock().get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_handlers_run_in_registration_order() {
        let hub = NotificationHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in 1..=3u64 {
            let log = Arc::clone(&log);
            hub.register(EventKind::AuditorAssigned, move |id| {
                log.lock().push((tag, id));
            });
        }
        hub.invoke(EventKind::AuditorAssigned, 42);

        assert_eq!(*log.lock(), vec![(1, 42), (2, 42), (3, 42)]);
    }

    #[test]
    fn test_panicking_handler_does_not_abort_siblings() {
        let hub = NotificationHub::new();
        let calls = Arc::new(AtomicU64::new(0));

        hub.register(EventKind::RequesterNotified, |_| panic!("boom"));
        let counter = Arc::clone(&calls);
        hub.register(EventKind::RequesterNotified, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        hub.invoke(EventKind::RequesterNotified, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_removes_all_handlers() {
        let hub = NotificationHub::new();
        hub.register(EventKind::StepExecuted, |_| {});
        hub.register(EventKind::StepExecuted, |_| {});
        assert_eq!(hub.handler_count(EventKind::StepExecuted), 2);

        hub.clear(EventKind::StepExecuted);
        assert_eq!(hub.handler_count(EventKind::StepExecuted), 0);

        // A cleared event invokes nothing and does not panic.
        hub.invoke(EventKind::StepExecuted, 1);
    }

    #[test]
    fn test_handler_may_reregister_without_deadlock() {
        let hub = Arc::new(NotificationHub::new());
        let hub2 = Arc::clone(&hub);
        hub.register(EventKind::StepExecuted, move |_| {
            hub2.register(EventKind::AuditorAssigned, |_| {});
        });

        hub.invoke(EventKind::StepExecuted, 1);
        assert_eq!(hub.handler_count(EventKind::AuditorAssigned), 1);
    }

    #[test]
    fn test_invoke_unknown_event_is_noop() {
        let hub = NotificationHub::new();
        hub.invoke(EventKind::AuditorAssigned, 9);
    }
}
