//! Completion signals and runtime gating
//!
//! Every cross-transaction edge of the DAG carries one [`CompletionSignal`].
//! The source transaction sends it when it finishes; the destination waits on
//! it before executing.

use crate::config::SchedulerConfig;
use crate::dag::{Dag, DagNode, DagNodeId, MessageSignalMapping, MsgIndex, TxIndex};
use crate::error::{SchedulerError, SchedulerResult};
use acl_metrics::{names, Metrics};
use acl_types::AccessOperation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalSlot {
    sent: AtomicBool,
    notify: Notify,
}

/// Single-use, one-slot signal. Clones share the slot.
///
/// `send` never blocks and may be called any number of times; `wait` returns
/// once the signal has been sent, whether before or after the wait started.
#[derive(Debug, Clone, Default)]
pub struct Signal {
    slot: Arc<SignalSlot>,
}

impl Signal {
    /// Create an unsent signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the signal sent and wake every waiter
    pub fn send(&self) {
        if !self.slot.sent.swap(true, Ordering::AcqRel) {
            self.slot.notify.notify_waiters();
        }
    }

    /// Check if the signal has been sent
    pub fn is_sent(&self) -> bool {
        self.slot.sent.load(Ordering::Acquire)
    }

    /// Wait until the signal is sent
    pub async fn wait(&self) {
        let notified = self.slot.notify.notified();
        let mut notified = std::pin::pin!(notified);
        // Register before checking the flag so a concurrent send is not missed
        notified.as_mut().enable();
        if self.is_sent() {
            return;
        }
        notified.await;
    }
}

/// Signal attached to one DAG edge
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    /// Node that must complete
    pub from_node: DagNodeId,
    /// Node that is blocked
    pub to_node: DagNodeId,
    /// Transaction of `from_node`
    pub from_tx: TxIndex,
    /// Transaction of `to_node`
    pub to_tx: TxIndex,
    /// Message of `from_node`
    pub from_msg: MsgIndex,
    /// Message of `to_node`
    pub to_msg: MsgIndex,
    /// Operation whose completion sends the signal
    pub completion_access_op: AccessOperation,
    /// Operation blocked until the signal is sent
    pub blocked_access_op: AccessOperation,
    signal: Signal,
}

impl CompletionSignal {
    pub(crate) fn new(from: &DagNode, to: &DagNode) -> Self {
        Self {
            from_node: from.id,
            to_node: to.id,
            from_tx: from.tx_index,
            to_tx: to.tx_index,
            from_msg: from.message_index,
            to_msg: to.message_index,
            completion_access_op: from.access_operation.clone(),
            blocked_access_op: to.access_operation.clone(),
            signal: Signal::new(),
        }
    }

    /// Send the signal
    pub fn send(&self) {
        self.signal.send();
    }

    /// Check if sent
    pub fn is_sent(&self) -> bool {
        self.signal.is_sent()
    }

    /// Wait for the signal
    pub async fn wait(&self) {
        self.signal.wait().await;
    }
}

fn signals(mapping: &MessageSignalMapping) -> impl Iterator<Item = &CompletionSignal> {
    mapping
        .values()
        .flat_map(|by_op| by_op.values())
        .flatten()
}

/// Send every signal in a transaction's completion mapping
pub fn send_all_signals_for_tx(mapping: &MessageSignalMapping) {
    for signal in signals(mapping) {
        signal.send();
    }
}

/// Wait until every signal in a transaction's blocking mapping is sent
pub async fn wait_for_all_signals_for_tx(mapping: &MessageSignalMapping) {
    for signal in signals(mapping) {
        signal.wait().await;
    }
}

/// [`wait_for_all_signals_for_tx`] bounded by `timeout`
pub async fn wait_for_all_signals_with_timeout(
    tx_index: TxIndex,
    mapping: &MessageSignalMapping,
    timeout: Duration,
) -> SchedulerResult<()> {
    match tokio::time::timeout(timeout, wait_for_all_signals_for_tx(mapping)).await {
        Ok(()) => Ok(()),
        Err(_) => {
            let pending = signals(mapping).filter(|s| !s.is_sent()).count();
            tracing::warn!(tx_index, pending, ?timeout, "timed out waiting on blocking signals");
            Err(SchedulerError::SignalTimeout {
                tx_index,
                pending,
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}

/// Per-transaction view of a finalized DAG used by an execution task
#[derive(Clone)]
pub struct TxGate {
    dag: Arc<Dag>,
    tx_index: TxIndex,
    timeout: Option<Duration>,
    metrics: Option<Arc<Metrics>>,
}

impl TxGate {
    /// Gate for `tx_index` that waits without bound
    pub fn new(dag: Arc<Dag>, tx_index: TxIndex) -> Self {
        Self {
            dag,
            tx_index,
            timeout: None,
            metrics: None,
        }
    }

    /// Gate bounded by the configured signal wait timeout
    pub fn from_config(dag: Arc<Dag>, tx_index: TxIndex, config: &SchedulerConfig) -> Self {
        Self::new(dag, tx_index).with_timeout(config.signal_wait_timeout())
    }

    /// Bound used by [`wait`](Self::wait)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Count wait timeouts in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Transaction this gate guards
    pub fn tx_index(&self) -> TxIndex {
        self.tx_index
    }

    /// Number of signals this transaction waits on
    pub fn blocking_count(&self) -> usize {
        self.dag
            .blocking_signals_for_tx(self.tx_index)
            .map_or(0, |mapping| signals(mapping).count())
    }

    /// Wait until every transaction this one depends on has completed.
    ///
    /// `None` waits without bound.
    pub async fn wait_ready(&self, timeout: Option<Duration>) -> SchedulerResult<()> {
        let Some(mapping) = self.dag.blocking_signals_for_tx(self.tx_index) else {
            return Ok(());
        };
        let Some(timeout) = timeout else {
            wait_for_all_signals_for_tx(mapping).await;
            return Ok(());
        };
        let result = wait_for_all_signals_with_timeout(self.tx_index, mapping, timeout).await;
        if result.is_err() {
            if let Some(metrics) = &self.metrics {
                metrics.increment(names::SIGNAL_WAIT_TIMEOUT, 1);
            }
        }
        result
    }

    /// [`wait_ready`](Self::wait_ready) with the gate's own bound
    pub async fn wait(&self) -> SchedulerResult<()> {
        self.wait_ready(self.timeout).await
    }

    /// Guard that releases this transaction's dependents when dropped
    pub fn completion_guard(&self) -> CompletionGuard {
        CompletionGuard {
            dag: Arc::clone(&self.dag),
            tx_index: self.tx_index,
        }
    }
}

/// Sends every completion signal of a transaction on drop, including on
/// early return or panic of the executing task
#[must_use = "dropping the guard immediately releases dependents"]
pub struct CompletionGuard {
    dag: Arc<Dag>,
    tx_index: TxIndex,
}

impl CompletionGuard {
    /// Release dependents now
    pub fn release(self) {}
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(mapping) = self.dag.completion_signals_for_tx(self.tx_index) {
            send_all_signals_for_tx(mapping);
        }
        tracing::trace!(tx_index = self.tx_index, "completion signals sent");
    }
}
