//! Structural checks over a flow's nodes and condition links.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::domain::{Flowlink, LinkKind, ProcessNode};
use crate::error::{EngineError, EngineResult};

/// Validate a flow definition before publish.
///
/// Checks: exactly one start node (`position == 0`), every condition link
/// references existing nodes (or the terminal sentinel), at least one
/// terminal link exists, and the condition topology is acyclic.
///
/// The engine itself trusts published configuration and performs no
/// per-operation revalidation; the design tooling that owns a [`FlowStore`]
/// is expected to run this check before setting `is_publish` on a flow.
///
/// [`FlowStore`]: crate::store::FlowStore
pub fn validate_flow(flow_id: u64, nodes: &[ProcessNode], links: &[Flowlink]) -> EngineResult<()> {
    let starts = nodes.iter().filter(|n| n.position == 0).count();
    if starts != 1 {
        return Err(EngineError::NoStartTransition(flow_id));
    }

    let mut graph = DiGraph::<u64, ()>::new();
    let mut index: HashMap<u64, NodeIndex> = HashMap::new();
    for node in nodes {
        index.insert(node.id, graph.add_node(node.id));
    }

    let mut terminal_seen = false;
    for link in links.iter().filter(|l| l.kind == LinkKind::Condition) {
        let source = *index
            .get(&link.process_id)
            .ok_or(EngineError::NodeNotFound(link.process_id))?;
        if link.is_terminal() {
            terminal_seen = true;
            continue;
        }
        let target_id = link.next_process_id as u64;
        let target = *index
            .get(&target_id)
            .ok_or(EngineError::NodeNotFound(target_id))?;
        graph.add_edge(source, target, ());
    }

    if !terminal_seen {
        return Err(EngineError::NoTransition(flow_id));
    }
    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(EngineError::CyclicFlow(flow_id));
    }

    Ok(())
}
