//! # acl-scheduler
//!
//! Dependency-DAG scheduling of block transactions from declared accesses.
//!
//! Each message declares the storage accesses it may perform. The scheduler
//! builds a DAG whose edges connect conflicting accesses of different
//! transactions, then gates execution so a transaction only runs once every
//! transaction it depends on has completed.
//!
//! Features:
//! - Conflict detection over the resource type hierarchy
//! - Completion signals on every cross-transaction edge
//! - Static and dynamically generated message dependencies
//! - Generic acyclicity check

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dag;
pub mod dependency;
pub mod error;
pub mod graph;
pub mod signal;

pub use config::SchedulerConfig;
pub use dag::{
    Dag, DagEdge, DagNode, DagNodeId, DagState, MessageAccessOps, MessageSignalMapping,
    MsgIndex, TxIndex, ANTE_MSG_INDEX,
};
pub use dependency::{
    BlockMessage, BlockTx, DependencyGenerator, DependencyResolver, MessageDependencyMapping,
};
pub use error::{SchedulerError, SchedulerResult};
pub use graph::{is_acyclic, topological_order, Graph};
pub use signal::{
    send_all_signals_for_tx, wait_for_all_signals_for_tx, wait_for_all_signals_with_timeout,
    CompletionGuard, CompletionSignal, Signal, TxGate,
};
