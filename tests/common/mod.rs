//! Shared fixture for routing integration tests: in-memory stores plus
//! helpers for assembling flow graphs.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use approvalflow::domain::{
    ConditionExpr, Dept, Emp, Flow, Flowlink, HookConfig, LinkKind, ProcessNode, TERMINAL,
};
use approvalflow::engine::Engine;
use approvalflow::hub::{EventKind, NotificationHub};
use approvalflow::store::{
    Directory, FlowStore, InstanceStore, MemoryDirectory, MemoryFlowStore, MemoryInstanceStore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub flows: Arc<MemoryFlowStore>,
    pub instances: Arc<MemoryInstanceStore>,
    pub directory: Arc<MemoryDirectory>,
    pub hub: Arc<NotificationHub>,
    pub engine: Engine,
    next_link_id: AtomicU64,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let flows = Arc::new(MemoryFlowStore::new());
        let instances = Arc::new(MemoryInstanceStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let hub = Arc::new(NotificationHub::new());
        let flows_port: Arc<dyn FlowStore> = flows.clone();
        let instances_port: Arc<dyn InstanceStore> = instances.clone();
        let directory_port: Arc<dyn Directory> = directory.clone();
        let engine = Engine::builder(flows_port, instances_port, directory_port)
            .hub(Arc::clone(&hub))
            .build();
        Self {
            flows,
            instances,
            directory,
            hub,
            engine,
            next_link_id: AtomicU64::new(0),
        }
    }

    fn link_id(&self) -> u64 {
        self.next_link_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn flow(&self, id: u64, published: bool) {
        self.flows.insert_flow(Flow {
            id,
            name: format!("flow-{id}"),
            is_publish: published,
        });
    }

    pub fn node(&self, id: u64, flow_id: u64, position: u32) {
        self.flows.insert_node(ProcessNode {
            id,
            flow_id,
            name: format!("step-{id}"),
            position,
            child_flow_id: 0,
            child_after: false,
            child_back_process: 0,
            expression_field: None,
        });
    }

    pub fn branch_node(&self, id: u64, flow_id: u64, position: u32, field: &str) {
        self.flows.insert_node(ProcessNode {
            id,
            flow_id,
            name: format!("step-{id}"),
            position,
            child_flow_id: 0,
            child_after: false,
            child_back_process: 0,
            expression_field: Some(field.to_string()),
        });
    }

    pub fn child_node(
        &self,
        id: u64,
        flow_id: u64,
        position: u32,
        child_flow_id: u64,
        child_after: bool,
        child_back_process: u64,
    ) {
        self.flows.insert_node(ProcessNode {
            id,
            flow_id,
            name: format!("step-{id}"),
            position,
            child_flow_id,
            child_after,
            child_back_process,
            expression_field: None,
        });
    }

    pub fn cond(&self, flow_id: u64, from: u64, to: i64, sort: u32) {
        self.cond_expr(flow_id, from, to, sort, None);
    }

    pub fn cond_expr(
        &self,
        flow_id: u64,
        from: u64,
        to: i64,
        sort: u32,
        expression: Option<ConditionExpr>,
    ) {
        self.flows.insert_link(Flowlink {
            id: self.link_id(),
            flow_id,
            process_id: from,
            next_process_id: to,
            kind: LinkKind::Condition,
            auditor: String::new(),
            expression,
            sort,
        });
    }

    pub fn auditor_link(&self, flow_id: u64, node: u64, kind: LinkKind, auditor: &str) {
        self.flows.insert_link(Flowlink {
            id: self.link_id(),
            flow_id,
            process_id: node,
            next_process_id: 0,
            kind,
            auditor: auditor.to_string(),
            expression: None,
            sort: 0,
        });
    }

    pub fn hook(&self, node: u64, name: &str) {
        self.flows.insert_hook(
            node,
            HookConfig {
                name: name.to_string(),
                config: serde_json::json!({}),
            },
        );
    }

    pub fn emp(&self, id: u64, dept_id: Option<u64>) {
        self.directory.insert_emp(Emp {
            id,
            name: format!("emp-{id}"),
            dept_id,
        });
    }

    pub fn dept(&self, id: u64, director_id: u64, manager_id: u64) {
        self.directory.insert_dept(Dept {
            id,
            name: format!("dept-{id}"),
            director_id,
            manager_id,
        });
    }

    /// Record every event the hub fires, in order.
    pub fn record_events(&self) -> Arc<Mutex<Vec<(EventKind, u64)>>> {
        let log: Arc<Mutex<Vec<(EventKind, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::AuditorAssigned,
            EventKind::RequesterNotified,
            EventKind::StepExecuted,
        ] {
            let log = Arc::clone(&log);
            self.hub.register(kind, move |id| log.lock().push((kind, id)));
        }
        log
    }

    /// A published two-step flow: unassigned start node `10`, review node
    /// `20` approved by department 3's director (employee 100), terminal
    /// after review. Requester is employee 50 in department 3.
    pub fn linear_dept_flow(&self) {
        self.flow(1, true);
        self.node(10, 1, 0);
        self.node(20, 1, 1);
        self.cond(1, 10, 20, 1);
        self.cond(1, 20, TERMINAL, 1);
        self.auditor_link(1, 20, LinkKind::Dept, "3");
        self.dept(3, 100, 101);
        self.emp(50, Some(3));
        self.emp(100, Some(3));
    }
}
