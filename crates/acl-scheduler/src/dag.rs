//! Dependency DAG over declared access operations
//!
//! The DAG is built one access operation at a time, in block order. Each new
//! node gets an edge from every earlier-transaction node whose access it
//! conflicts with, and every edge carries a [`CompletionSignal`] indexed both
//! by the transaction that sends it and by the transaction that waits on it.

use crate::error::{SchedulerError, SchedulerResult};
use crate::graph::{self, Graph};
use crate::signal::CompletionSignal;
use acl_types::{AccessOperation, AccessType, ResourceType, WILDCARD_IDENTIFIER};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Position of a transaction in the block
pub type TxIndex = usize;

/// Position of a message in its transaction
pub type MsgIndex = i32;

/// Message index used for ante-handler access operations
pub const ANTE_MSG_INDEX: MsgIndex = -1;

/// Dense node identifier, allocated from 0 in insertion order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DagNodeId(pub usize);

/// One declared access of one message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DagNode {
    /// Node id
    pub id: DagNodeId,
    /// Message index, or [`ANTE_MSG_INDEX`]
    pub message_index: MsgIndex,
    /// Transaction index
    pub tx_index: TxIndex,
    /// Declared access
    pub access_operation: AccessOperation,
}

/// `from` must complete before `to` may proceed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DagEdge {
    /// Source node
    pub from: DagNodeId,
    /// Destination node
    pub to: DagNodeId,
}

/// Lifecycle of a DAG
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DagState {
    /// No node added yet
    Empty,
    /// Nodes are being added
    Accumulating,
    /// Checked acyclic and frozen
    Finalized,
}

/// `message index → access operation → signals`
pub type MessageSignalMapping =
    BTreeMap<MsgIndex, HashMap<AccessOperation, Vec<CompletionSignal>>>;

/// `message index → declared access operations`
pub type MessageAccessOps = BTreeMap<MsgIndex, Vec<AccessOperation>>;

/// `identifier → nodes`, in insertion order
type IdentifierNodes = HashMap<String, Vec<DagNodeId>>;

/// Dependency graph for one block
#[derive(Debug, Default)]
pub struct Dag {
    nodes: Vec<DagNode>,
    /// Outgoing edges, parallel to `nodes`
    edges: Vec<Vec<DagEdge>>,
    edge_count: usize,
    resource_access: HashMap<(ResourceType, AccessType), IdentifierNodes>,
    /// Latest node of each transaction
    tx_latest_node: HashMap<TxIndex, DagNodeId>,
    completion_signals: HashMap<TxIndex, MessageSignalMapping>,
    blocking_signals: HashMap<TxIndex, MessageSignalMapping>,
    tx_msg_access_ops: HashMap<TxIndex, MessageAccessOps>,
    finalized: bool,
}

impl Dag {
    /// Create an empty DAG
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the declared access list of a message
    pub fn add_access_ops_for_msg(
        &mut self,
        message_index: MsgIndex,
        tx_index: TxIndex,
        access_ops: Vec<AccessOperation>,
    ) {
        self.tx_msg_access_ops
            .entry(tx_index)
            .or_default()
            .insert(message_index, access_ops);
    }

    fn add_node(
        &mut self,
        message_index: MsgIndex,
        tx_index: TxIndex,
        access_operation: AccessOperation,
    ) -> DagNodeId {
        let id = DagNodeId(self.nodes.len());
        self.nodes.push(DagNode {
            id,
            message_index,
            tx_index,
            access_operation,
        });
        self.edges.push(Vec::new());
        id
    }

    /// Add one access operation and the edges from every earlier transaction it
    /// conflicts with.
    ///
    /// Operations of a transaction must be added in declaration order, ending
    /// with its commit operation, and transactions in block order.
    pub fn add_node_build_dependency(
        &mut self,
        message_index: MsgIndex,
        tx_index: TxIndex,
        access_operation: AccessOperation,
    ) -> DagNodeId {
        let id = self.add_node(message_index, tx_index, access_operation);
        self.tx_latest_node.insert(tx_index, id);

        for dependency in self.node_dependencies(id) {
            if let Some(edge) = self.add_edge(dependency, id) {
                self.add_completion_signal(edge);
            }
        }

        let op = &self.nodes[id.0].access_operation;
        self.resource_access
            .entry((op.resource_type, op.access_type))
            .or_default()
            .entry(op.identifier_template.clone())
            .or_default()
            .push(id);

        id
    }

    /// Add an edge. No-op if either node is missing or both belong to the
    /// same transaction.
    pub fn add_edge(&mut self, from: DagNodeId, to: DagNodeId) -> Option<DagEdge> {
        let from_tx = self.nodes.get(from.0)?.tx_index;
        let to_tx = self.nodes.get(to.0)?.tx_index;
        if from_tx == to_tx {
            return None;
        }

        let edge = DagEdge { from, to };
        self.edges[from.0].push(edge);
        self.edge_count += 1;
        Some(edge)
    }

    fn add_completion_signal(&mut self, edge: DagEdge) {
        let (Some(from), Some(to)) = (self.nodes.get(edge.from.0), self.nodes.get(edge.to.0)) else {
            return;
        };
        let signal = CompletionSignal::new(from, to);

        self.blocking_signals
            .entry(signal.to_tx)
            .or_default()
            .entry(signal.to_msg)
            .or_default()
            .entry(signal.blocked_access_op.clone())
            .or_default()
            .push(signal.clone());

        self.completion_signals
            .entry(signal.from_tx)
            .or_default()
            .entry(signal.from_msg)
            .or_default()
            .entry(signal.completion_access_op.clone())
            .or_default()
            .push(signal);
    }

    /// Earlier-transaction nodes the node `id` must wait on
    fn node_dependencies(&self, id: DagNodeId) -> BTreeSet<DagNodeId> {
        let mut dependencies = BTreeSet::new();
        let Some(node) = self.nodes.get(id.0) else {
            return dependencies;
        };
        let op = &node.access_operation;

        let conflicting: &[AccessType] = match op.access_type {
            AccessType::Read => &[AccessType::Write, AccessType::Unknown],
            AccessType::Write | AccessType::Unknown => {
                &[AccessType::Write, AccessType::Unknown, AccessType::Read]
            }
            AccessType::Commit => return dependencies,
        };

        for resource in op.resource_type.resource_dependencies() {
            for &access in conflicting {
                let Some(by_identifier) = self.resource_access.get(&(resource, access)) else {
                    continue;
                };
                for candidate in Self::matching_nodes(by_identifier, resource, op) {
                    let Some(candidate_tx) = self.nodes.get(candidate.0).map(|n| n.tx_index) else {
                        continue;
                    };
                    if candidate_tx >= node.tx_index {
                        continue;
                    }
                    // Reads are tracked individually; anything that may have
                    // written waits for the whole earlier transaction
                    let dependency = match access {
                        AccessType::Read => candidate,
                        _ => self
                            .tx_latest_node
                            .get(&candidate_tx)
                            .copied()
                            .unwrap_or(candidate),
                    };
                    dependencies.insert(dependency);
                }
            }
        }

        dependencies
    }

    /// Nodes of `by_identifier` whose identifier may overlap `op`'s.
    ///
    /// Identifiers only narrow the match within `op`'s own resource type.
    fn matching_nodes<'a>(
        by_identifier: &'a IdentifierNodes,
        resource: ResourceType,
        op: &AccessOperation,
    ) -> Box<dyn Iterator<Item = DagNodeId> + 'a> {
        if resource != op.resource_type || op.is_wildcard() {
            return Box::new(by_identifier.values().flatten().copied());
        }
        let exact = by_identifier.get(&op.identifier_template).into_iter();
        let wildcard = by_identifier.get(WILDCARD_IDENTIFIER).into_iter();
        Box::new(exact.chain(wildcard).flatten().copied())
    }

    /// Check the graph is acyclic and freeze it for shared read-only use
    pub fn finalize(mut self) -> SchedulerResult<Arc<Dag>> {
        if !graph::is_acyclic(&self) {
            tracing::error!(
                nodes = self.node_count(),
                edges = self.edge_count,
                "cycle detected in DAG"
            );
            return Err(SchedulerError::CycleInDag {
                nodes: self.node_count(),
            });
        }
        self.finalized = true;
        tracing::debug!(
            nodes = self.node_count(),
            edges = self.edge_count,
            txs = self.tx_latest_node.len(),
            "dependency DAG finalized"
        );
        Ok(Arc::new(self))
    }

    /// Current lifecycle state
    pub fn state(&self) -> DagState {
        if self.finalized {
            DagState::Finalized
        } else if self.nodes.is_empty() {
            DagState::Empty
        } else {
            DagState::Accumulating
        }
    }

    /// Get a node
    pub fn node(&self, id: DagNodeId) -> Option<&DagNode> {
        self.nodes.get(id.0)
    }

    /// All nodes, by id
    pub fn nodes(&self) -> &[DagNode] {
        &self.nodes
    }

    /// Outgoing edges of `id`
    pub fn edges_from(&self, id: DagNodeId) -> &[DagEdge] {
        self.edges.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every edge, grouped by source node
    pub fn edges(&self) -> impl Iterator<Item = &DagEdge> {
        self.edges.iter().flatten()
    }

    /// Check if an edge `from → to` exists
    pub fn has_edge(&self, from: DagNodeId, to: DagNodeId) -> bool {
        self.edges_from(from).iter().any(|e| e.to == to)
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Latest node added for `tx_index`
    pub fn latest_node_for_tx(&self, tx_index: TxIndex) -> Option<DagNodeId> {
        self.tx_latest_node.get(&tx_index).copied()
    }

    /// Signals `tx_index` sends when it completes
    pub fn completion_signals_for_tx(&self, tx_index: TxIndex) -> Option<&MessageSignalMapping> {
        self.completion_signals.get(&tx_index)
    }

    /// Signals `tx_index` waits on before executing
    pub fn blocking_signals_for_tx(&self, tx_index: TxIndex) -> Option<&MessageSignalMapping> {
        self.blocking_signals.get(&tx_index)
    }

    /// Declared access lists of every message of `tx_index`
    pub fn access_ops_for_tx(&self, tx_index: TxIndex) -> Option<&MessageAccessOps> {
        self.tx_msg_access_ops.get(&tx_index)
    }

    /// Declared access list of one message
    pub fn access_ops_for_msg(
        &self,
        tx_index: TxIndex,
        message_index: MsgIndex,
    ) -> Option<&[AccessOperation]> {
        self.tx_msg_access_ops
            .get(&tx_index)?
            .get(&message_index)
            .map(Vec::as_slice)
    }
}

impl Graph for Dag {
    fn order(&self) -> usize {
        self.nodes.len()
    }

    fn visit(&self, v: usize, f: &mut dyn FnMut(usize) -> bool) -> bool {
        self.edges
            .get(v)
            .is_some_and(|edges| edges.iter().any(|e| f(e.to.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: &str) -> AccessOperation {
        AccessOperation::read(ResourceType::KvBankBalances, id)
    }

    fn write(id: &str) -> AccessOperation {
        AccessOperation::write(ResourceType::KvBankBalances, id)
    }

    fn add_tx(dag: &mut Dag, tx: TxIndex, ops: Vec<AccessOperation>) -> Vec<DagNodeId> {
        let mut ops = ops;
        ops.push(AccessOperation::commit());
        dag.add_access_ops_for_msg(0, tx, ops.clone());
        ops.into_iter()
            .map(|op| dag.add_node_build_dependency(0, tx, op))
            .collect()
    }

    fn edge_set(dag: &Dag) -> BTreeSet<(usize, usize)> {
        dag.edges().map(|e| (e.from.0, e.to.0)).collect()
    }

    // ==================== Construction ====================

    #[test]
    fn test_empty_dag() {
        let dag = Dag::new();
        assert_eq!(dag.state(), DagState::Empty);
        assert_eq!(dag.node_count(), 0);
        let dag = dag.finalize().unwrap();
        assert_eq!(dag.state(), DagState::Finalized);
    }

    #[test]
    fn test_node_ids_dense() {
        let mut dag = Dag::new();
        let ids = add_tx(&mut dag, 0, vec![write("a"), read("b")]);
        assert_eq!(ids, vec![DagNodeId(0), DagNodeId(1), DagNodeId(2)]);
        assert_eq!(dag.state(), DagState::Accumulating);
        assert_eq!(dag.latest_node_for_tx(0), Some(DagNodeId(2)));
        assert!(dag.node(DagNodeId(2)).unwrap().access_operation.is_commit());
    }

    #[test]
    fn test_block_example() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("A"), read("B")]);
        add_tx(&mut dag, 1, vec![read("A"), read("B")]);
        add_tx(&mut dag, 2, vec![read("B"), read("A")]);
        add_tx(&mut dag, 3, vec![write("B")]);

        assert_eq!(dag.node_count(), 11);
        let expected: BTreeSet<_> = [(2, 3), (2, 7), (1, 9), (4, 9), (6, 9)].into_iter().collect();
        assert_eq!(edge_set(&dag), expected);
        assert_eq!(dag.edge_count(), 5);
    }

    #[test]
    fn test_read_read_no_edge() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![read("a")]);
        add_tx(&mut dag, 1, vec![read("a")]);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn test_write_write_waits_for_commit() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a"), read("z")]);
        let tx1 = add_tx(&mut dag, 1, vec![write("a")]);
        assert!(dag.has_edge(DagNodeId(2), tx1[0]));
        assert_eq!(dag.edge_count(), 1);
    }

    #[test]
    fn test_disjoint_identifiers_no_edge() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        add_tx(&mut dag, 1, vec![write("b"), read("c")]);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn test_unknown_conflicts_like_write() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![AccessOperation::unknown(ResourceType::KvBankBalances, "a")]);
        let tx1 = add_tx(&mut dag, 1, vec![read("a")]);
        assert!(dag.has_edge(DagNodeId(1), tx1[0]));
    }

    #[test]
    fn test_commit_has_no_dependencies() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        let commit = dag.add_node_build_dependency(0, 1, AccessOperation::commit());
        assert!(dag.edges().all(|e| e.to != commit));
    }

    // ==================== Identifier and Hierarchy Matching ====================

    #[test]
    fn test_wildcard_write_blocks_specific_read() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("*")]);
        let tx1 = add_tx(&mut dag, 1, vec![read("anything")]);
        assert!(dag.has_edge(DagNodeId(1), tx1[0]));
    }

    #[test]
    fn test_wildcard_read_sees_every_write() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("x")]);
        add_tx(&mut dag, 1, vec![write("y")]);
        let tx2 = add_tx(&mut dag, 2, vec![read("*")]);
        assert!(dag.has_edge(DagNodeId(1), tx2[0]));
        assert!(dag.has_edge(DagNodeId(3), tx2[0]));
    }

    #[test]
    fn test_parent_write_blocks_child_read() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![AccessOperation::write(ResourceType::KvBank, "*")]);
        let tx1 = add_tx(&mut dag, 1, vec![read("a")]);
        assert!(dag.has_edge(DagNodeId(1), tx1[0]));
    }

    #[test]
    fn test_child_write_blocks_parent_read() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        let tx1 = add_tx(&mut dag, 1, vec![AccessOperation::read(ResourceType::Kv, "*")]);
        assert!(dag.has_edge(DagNodeId(1), tx1[0]));
    }

    #[test]
    fn test_sibling_types_independent() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        add_tx(&mut dag, 1, vec![AccessOperation::write(ResourceType::KvBankSupply, "a")]);
        add_tx(&mut dag, 2, vec![AccessOperation::write(ResourceType::KvOracleFeeders, "a")]);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn test_synchronous_tx_serializes_with_everything() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![read("a")]);
        add_tx(&mut dag, 1, vec![AccessOperation::unknown(ResourceType::Any, "*")]);
        add_tx(&mut dag, 2, vec![AccessOperation::read(ResourceType::KvDexMemOrder, "o")]);
        assert!(dag.has_edge(DagNodeId(0), DagNodeId(2)));
        assert!(dag.has_edge(DagNodeId(3), DagNodeId(4)));
    }

    // ==================== Edges and Signals ====================

    #[test]
    fn test_add_edge_noops() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        add_tx(&mut dag, 1, vec![write("b")]);
        assert!(dag.add_edge(DagNodeId(0), DagNodeId(1)).is_none());
        assert!(dag.add_edge(DagNodeId(0), DagNodeId(99)).is_none());
        assert!(dag.add_edge(DagNodeId(99), DagNodeId(0)).is_none());
        assert!(dag.add_edge(DagNodeId(0), DagNodeId(2)).is_some());
        assert_eq!(dag.edge_count(), 1);
    }

    #[test]
    fn test_signals_indexed_both_ways() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        add_tx(&mut dag, 1, vec![read("a")]);

        let completion = dag.completion_signals_for_tx(0).unwrap();
        let signals = &completion[&0][&AccessOperation::commit()];
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].to_tx, 1);

        let blocking = dag.blocking_signals_for_tx(1).unwrap();
        let blocked = &blocking[&0][&read("a")];
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].from_node, DagNodeId(1));

        // Both indexes share the same slot
        signals[0].send();
        assert!(blocked[0].is_sent());
        assert!(dag.blocking_signals_for_tx(0).is_none());
    }

    #[test]
    fn test_access_ops_recorded() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 4, vec![write("a")]);
        assert_eq!(dag.access_ops_for_msg(4, 0).unwrap().len(), 2);
        assert!(dag.access_ops_for_msg(4, 1).is_none());
        assert_eq!(dag.access_ops_for_tx(4).unwrap().len(), 1);
    }

    #[test]
    fn test_finalize_rejects_cycle() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        add_tx(&mut dag, 1, vec![write("a")]);
        assert!(dag.add_edge(DagNodeId(2), DagNodeId(1)).is_some());
        let err = dag.finalize().unwrap_err();
        assert!(matches!(err, SchedulerError::CycleInDag { nodes: 4 }));
    }

    #[test]
    fn test_graph_contract() {
        let mut dag = Dag::new();
        add_tx(&mut dag, 0, vec![write("a")]);
        add_tx(&mut dag, 1, vec![read("a")]);
        assert_eq!(dag.order(), 4);
        let mut successors = Vec::new();
        dag.visit(1, &mut |w| {
            successors.push(w);
            false
        });
        assert_eq!(successors, vec![2]);
        assert!(graph::topological_order(&dag).is_some());
    }
}
