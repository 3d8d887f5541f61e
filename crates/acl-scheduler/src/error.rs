//! Error types for the scheduler

use crate::dag::TxIndex;
use acl_types::TypesError;
use thiserror::Error;

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The built dependency graph contains a cycle
    #[error("cycle detected in DAG with {nodes} nodes")]
    CycleInDag {
        /// Node count of the rejected graph
        nodes: usize,
    },

    /// Governance messages cannot be scheduled in parallel
    #[error("governance message {message_key} in transaction {tx_index}")]
    GovMsgInBlock {
        /// Transaction carrying the message
        tx_index: TxIndex,
        /// Message key of the offending message
        message_key: String,
    },

    /// A declared access operation failed validation
    #[error("invalid access operation: {0}")]
    InvalidAccessOp(#[from] TypesError),

    /// Dynamic dependency generation failed
    #[error("dependency generation failed for {message_key}: {reason}")]
    DependencyGeneration {
        /// Message key whose generator failed
        message_key: String,
        /// Generator error
        reason: String,
    },

    /// A transaction carries more messages than a message index can address
    #[error("transaction {tx_index} has message {message_index} beyond the index range")]
    MessageIndexOverflow {
        /// Offending transaction
        tx_index: TxIndex,
        /// Position of the message in the transaction
        message_index: usize,
    },

    /// Blocking signals were not all received in time
    #[error("transaction {tx_index} timed out after {timeout_ms}ms waiting on {pending} signals")]
    SignalTimeout {
        /// Waiting transaction
        tx_index: TxIndex,
        /// Signals still outstanding when the wait expired
        pending: usize,
        /// Configured wait bound
        timeout_ms: u64,
    },

    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
