//! Message dependency resolution and block DAG construction
//!
//! Each message type maps to a static list of declared access operations.
//! A message type may also register a generator that derives a narrower list
//! from the message contents; a failing or invalid generator is switched off
//! and the static list is used instead, so a bad generator never aborts a block.

use crate::config::SchedulerConfig;
use crate::dag::{Dag, MsgIndex, TxIndex, ANTE_MSG_INDEX};
use crate::error::{SchedulerError, SchedulerResult};
use crate::signal::TxGate;
use acl_metrics::{names, timed, MetricKey, Metrics};
use acl_types::{
    synchronous_access_ops, validate_access_op, validate_access_ops, AccessOperation,
    AccessOperationSet,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A message as seen by the scheduler
pub trait BlockMessage {
    /// Key identifying the message type
    fn message_key(&self) -> String;

    /// Check if this is a governance message
    fn is_governance(&self) -> bool {
        false
    }
}

/// Derives access operations from a message's contents
pub trait DependencyGenerator<M>: Send + Sync {
    /// Generate the declared access list; must end with the commit operation
    fn generate(&self, msg: &M) -> SchedulerResult<Vec<AccessOperation>>;
}

impl<M, F> DependencyGenerator<M> for F
where
    F: Fn(&M) -> SchedulerResult<Vec<AccessOperation>> + Send + Sync,
{
    fn generate(&self, msg: &M) -> SchedulerResult<Vec<AccessOperation>> {
        self(msg)
    }
}

/// Static access declaration of a message type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDependencyMapping {
    /// Message type key
    pub message_key: String,
    /// Declared accesses, commit last
    pub access_ops: Vec<AccessOperation>,
    /// Prefer the registered generator when present
    #[serde(default)]
    pub dynamic_enabled: bool,
}

impl MessageDependencyMapping {
    /// Mapping with dynamic generation disabled
    pub fn new(message_key: impl Into<String>, access_ops: Vec<AccessOperation>) -> Self {
        Self {
            message_key: message_key.into(),
            access_ops,
            dynamic_enabled: false,
        }
    }

    /// Fully synchronous mapping, used for message types with no declaration
    pub fn synchronous(message_key: impl Into<String>) -> Self {
        Self::new(message_key, synchronous_access_ops())
    }

    /// Enable dynamic generation
    pub fn with_dynamic(mut self) -> Self {
        self.dynamic_enabled = true;
        self
    }
}

/// One transaction of a block
#[derive(Debug, Clone)]
pub struct BlockTx<M> {
    /// Accesses of the ante handler, deduplicated before use
    pub ante_ops: Vec<AccessOperation>,
    /// Messages in execution order
    pub messages: Vec<M>,
}

impl<M> BlockTx<M> {
    /// Transaction with no ante accesses
    pub fn new(messages: Vec<M>) -> Self {
        Self {
            ante_ops: Vec::new(),
            messages,
        }
    }

    /// Set the ante-handler accesses
    pub fn with_ante_ops(mut self, ante_ops: Vec<AccessOperation>) -> Self {
        self.ante_ops = ante_ops;
        self
    }
}

/// In-memory registry of dependency mappings and generators
pub struct DependencyResolver<M> {
    config: SchedulerConfig,
    mappings: RwLock<HashMap<String, MessageDependencyMapping>>,
    generators: RwLock<HashMap<String, Arc<dyn DependencyGenerator<M>>>>,
    metrics: Arc<Metrics>,
}

impl<M: BlockMessage> DependencyResolver<M> {
    /// Resolver reporting to the process-wide metrics registry
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_metrics(config, Metrics::global())
    }

    /// Resolver reporting to `metrics`
    pub fn with_metrics(config: SchedulerConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            config,
            mappings: RwLock::new(HashMap::new()),
            generators: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Metrics registry
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Execution gate for `tx_index` using this resolver's wait bound and metrics
    pub fn tx_gate(&self, dag: &Arc<Dag>, tx_index: TxIndex) -> TxGate {
        TxGate::from_config(Arc::clone(dag), tx_index, &self.config)
            .with_metrics(Arc::clone(&self.metrics))
    }

    /// Store a mapping after validating its access list
    pub fn set_mapping(&self, mapping: MessageDependencyMapping) -> SchedulerResult<()> {
        validate_access_ops(&mapping.access_ops)?;
        self.mappings
            .write()
            .insert(mapping.message_key.clone(), mapping);
        Ok(())
    }

    /// Stored mapping, or the synchronous default
    pub fn mapping(&self, message_key: &str) -> MessageDependencyMapping {
        self.mappings
            .read()
            .get(message_key)
            .cloned()
            .unwrap_or_else(|| MessageDependencyMapping::synchronous(message_key))
    }

    /// Remove a stored mapping
    pub fn remove_mapping(&self, message_key: &str) -> Option<MessageDependencyMapping> {
        self.mappings.write().remove(message_key)
    }

    /// Turn dynamic generation on or off for a message type
    pub fn set_dynamic_flag(&self, message_key: &str, enabled: bool) {
        self.mappings
            .write()
            .entry(message_key.to_string())
            .or_insert_with(|| MessageDependencyMapping::synchronous(message_key))
            .dynamic_enabled = enabled;
    }

    /// Register the generator of a message type
    pub fn register_generator<G>(&self, message_key: impl Into<String>, generator: G)
    where
        G: DependencyGenerator<M> + 'static,
    {
        self.generators
            .write()
            .insert(message_key.into(), Arc::new(generator));
    }

    /// Access operations of `msg`.
    ///
    /// Uses the generator when dynamic generation is enabled. If that fails,
    /// the dynamic flag is switched off and the static declaration is returned.
    pub fn message_dependencies(&self, msg: &M) -> Vec<AccessOperation> {
        let key = msg.message_key();
        let mapping = self.mapping(&key);
        if !mapping.dynamic_enabled {
            return mapping.access_ops;
        }

        let generator = self.generators.read().get(&key).cloned();
        match generator {
            Some(generator) => {
                let generated = generator.generate(msg).and_then(|ops| {
                    validate_access_ops(&ops)?;
                    Ok(ops)
                });
                match generated {
                    Ok(ops) => return ops,
                    Err(e) => tracing::error!(
                        message_key = %key,
                        error = %e,
                        "dynamic dependency generation failed"
                    ),
                }
            }
            None => tracing::warn!(
                message_key = %key,
                "dynamic dependencies enabled without a generator"
            ),
        }

        self.set_dynamic_flag(&key, false);
        self.metrics.increment(
            MetricKey::new(names::DYNAMIC_DEPENDENCY_FALLBACK)
                .with_label("message_key", key.as_str()),
            1,
        );
        tracing::info!(message_key = %key, "disabled dynamic dependencies, using static mapping");
        mapping.access_ops
    }

    /// Build and finalize the dependency DAG of a block
    pub fn build_dependency_dag(&self, txs: &[BlockTx<M>]) -> SchedulerResult<Arc<Dag>> {
        let result = if self.config.record_metrics {
            timed!(self.metrics, names::DAG_BUILD_DURATION_MS, {
                self.assemble_dag(txs)
            })
        } else {
            self.assemble_dag(txs)
        };

        if let Ok(dag) = &result {
            if self.config.record_metrics {
                self.metrics
                    .set_gauge(names::DAG_NODE_COUNT, dag.node_count() as i64);
                self.metrics
                    .set_gauge(names::DAG_EDGE_COUNT, dag.edge_count() as i64);
            }
            tracing::info!(
                txs = txs.len(),
                nodes = dag.node_count(),
                edges = dag.edge_count(),
                "built dependency DAG"
            );
        }
        result
    }

    fn assemble_dag(&self, txs: &[BlockTx<M>]) -> SchedulerResult<Arc<Dag>> {
        let mut dag = Dag::new();

        for (tx_index, tx) in txs.iter().enumerate() {
            let ante_ops: AccessOperationSet = tx.ante_ops.iter().cloned().collect();
            for op in ante_ops.to_vec() {
                validate_access_op(&op)?;
                dag.add_node_build_dependency(ANTE_MSG_INDEX, tx_index, op);
            }

            for (message_index, msg) in tx.messages.iter().enumerate() {
                self.check_governance(tx_index, msg)?;
                let message_index = to_msg_index(tx_index, message_index)?;
                let ops = self.message_dependencies(msg);
                dag.add_access_ops_for_msg(message_index, tx_index, ops.clone());
                for op in ops {
                    dag.add_node_build_dependency(message_index, tx_index, op);
                }
            }
        }

        dag.finalize()
    }

    fn check_governance(&self, tx_index: TxIndex, msg: &M) -> SchedulerResult<()> {
        if self.config.reject_governance_messages && msg.is_governance() {
            let message_key = msg.message_key();
            tracing::warn!(tx_index, message_key = %message_key, "governance message in block");
            return Err(SchedulerError::GovMsgInBlock {
                tx_index,
                message_key,
            });
        }
        Ok(())
    }
}

fn to_msg_index(tx_index: TxIndex, message_index: usize) -> SchedulerResult<MsgIndex> {
    MsgIndex::try_from(message_index).map_err(|_| SchedulerError::MessageIndexOverflow {
        tx_index,
        message_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl_types::{is_synchronous_access_ops, ResourceType};

    #[derive(Clone)]
    struct TestMsg {
        key: &'static str,
        governance: bool,
        target: &'static str,
    }

    impl TestMsg {
        fn send(target: &'static str) -> Self {
            Self {
                key: "bank/MsgSend",
                governance: false,
                target,
            }
        }
    }

    impl BlockMessage for TestMsg {
        fn message_key(&self) -> String {
            self.key.to_string()
        }

        fn is_governance(&self) -> bool {
            self.governance
        }
    }

    fn resolver() -> DependencyResolver<TestMsg> {
        DependencyResolver::with_metrics(SchedulerConfig::default(), Arc::new(Metrics::new()))
    }

    fn static_send_ops() -> Vec<AccessOperation> {
        vec![
            AccessOperation::write(ResourceType::KvBankBalances, "*"),
            AccessOperation::commit(),
        ]
    }

    fn dynamic_send_mapping() -> MessageDependencyMapping {
        MessageDependencyMapping::new("bank/MsgSend", static_send_ops()).with_dynamic()
    }

    fn generated_ops(msg: &TestMsg) -> SchedulerResult<Vec<AccessOperation>> {
        Ok(vec![
            AccessOperation::write(ResourceType::KvBankBalances, msg.target),
            AccessOperation::commit(),
        ])
    }

    // ==================== Mappings ====================

    #[test]
    fn test_missing_mapping_is_synchronous() {
        let resolver = resolver();
        let ops = resolver.message_dependencies(&TestMsg::send("a"));
        assert!(is_synchronous_access_ops(&ops));
    }

    #[test]
    fn test_set_mapping_validates() {
        let resolver = resolver();
        let bad = MessageDependencyMapping::new(
            "bank/MsgSend",
            vec![AccessOperation::write(ResourceType::KvBankBalances, "*")],
        );
        assert!(matches!(
            resolver.set_mapping(bad),
            Err(SchedulerError::InvalidAccessOp(_))
        ));

        let good = MessageDependencyMapping::new("bank/MsgSend", static_send_ops());
        resolver.set_mapping(good.clone()).unwrap();
        assert_eq!(resolver.mapping("bank/MsgSend"), good);
        assert_eq!(resolver.remove_mapping("bank/MsgSend"), Some(good));
    }

    #[test]
    fn test_static_mapping_ignores_generator_when_disabled() {
        let resolver = resolver();
        resolver
            .set_mapping(MessageDependencyMapping::new("bank/MsgSend", static_send_ops()))
            .unwrap();
        resolver.register_generator("bank/MsgSend", generated_ops);
        assert_eq!(resolver.message_dependencies(&TestMsg::send("a")), static_send_ops());
    }

    // ==================== Dynamic Generation ====================

    #[test]
    fn test_dynamic_generator_used() {
        let resolver = resolver();
        resolver.set_mapping(dynamic_send_mapping()).unwrap();
        resolver.register_generator("bank/MsgSend", generated_ops);

        let ops = resolver.message_dependencies(&TestMsg::send("alice"));
        assert_eq!(ops[0].identifier_template, "alice");
        assert!(resolver.mapping("bank/MsgSend").dynamic_enabled);
    }

    #[test]
    fn test_failing_generator_falls_back_and_disables() {
        let resolver = resolver();
        resolver.set_mapping(dynamic_send_mapping()).unwrap();
        let failing = |msg: &TestMsg| -> SchedulerResult<Vec<AccessOperation>> {
            Err(SchedulerError::DependencyGeneration {
                message_key: msg.message_key(),
                reason: "state unavailable".to_string(),
            })
        };
        resolver.register_generator("bank/MsgSend", failing);

        let ops = resolver.message_dependencies(&TestMsg::send("a"));
        assert_eq!(ops, static_send_ops());
        assert!(!resolver.mapping("bank/MsgSend").dynamic_enabled);
        assert_eq!(
            resolver.metrics().counter_total(names::DYNAMIC_DEPENDENCY_FALLBACK),
            1
        );
    }

    #[test]
    fn test_invalid_generated_ops_fall_back() {
        let resolver = resolver();
        resolver.set_mapping(dynamic_send_mapping()).unwrap();
        let missing_commit = |_: &TestMsg| -> SchedulerResult<Vec<AccessOperation>> {
            Ok(vec![AccessOperation::read(ResourceType::KvBankBalances, "a")])
        };
        resolver.register_generator("bank/MsgSend", missing_commit);

        assert_eq!(resolver.message_dependencies(&TestMsg::send("a")), static_send_ops());
        assert!(!resolver.mapping("bank/MsgSend").dynamic_enabled);
    }

    #[test]
    fn test_dynamic_without_generator_disables() {
        let resolver = resolver();
        resolver.set_mapping(dynamic_send_mapping()).unwrap();
        assert_eq!(resolver.message_dependencies(&TestMsg::send("a")), static_send_ops());
        assert!(!resolver.mapping("bank/MsgSend").dynamic_enabled);
    }

    // ==================== DAG Construction ====================

    #[test]
    fn test_build_dag_with_generated_ops() {
        let resolver = resolver();
        resolver.set_mapping(dynamic_send_mapping()).unwrap();
        resolver.register_generator("bank/MsgSend", generated_ops);

        let txs = vec![
            BlockTx::new(vec![TestMsg::send("a")]),
            BlockTx::new(vec![TestMsg::send("b")]),
            BlockTx::new(vec![TestMsg::send("a")]),
        ];
        let dag = resolver.build_dependency_dag(&txs).unwrap();
        assert_eq!(dag.node_count(), 6);
        // Only tx 0 and tx 2 touch the same balance
        assert_eq!(dag.edge_count(), 1);
        assert!(dag.blocking_signals_for_tx(1).is_none());
        assert!(dag.blocking_signals_for_tx(2).is_some());

        let metrics = resolver.metrics();
        let h = metrics
            .histogram(&MetricKey::new(names::DAG_BUILD_DURATION_MS))
            .unwrap();
        assert_eq!(h.total_count(), 1);
        assert_eq!(metrics.gauge(&MetricKey::new(names::DAG_NODE_COUNT)), Some(6));
    }

    #[test]
    fn test_message_index_range() {
        assert_eq!(to_msg_index(0, 3).unwrap(), 3);
        let beyond = MsgIndex::MAX as usize + 1;
        assert!(matches!(
            to_msg_index(4, beyond),
            Err(SchedulerError::MessageIndexOverflow {
                tx_index: 4,
                message_index,
            }) if message_index == beyond
        ));
    }

    #[tokio::test]
    async fn test_tx_gate_uses_configured_timeout() {
        let config = SchedulerConfig::from_toml_str("signal_wait_timeout_ms = 20").unwrap();
        let resolver =
            DependencyResolver::<TestMsg>::with_metrics(config, Arc::new(Metrics::new()));
        resolver.set_mapping(dynamic_send_mapping()).unwrap();
        resolver.register_generator("bank/MsgSend", generated_ops);
        let txs = vec![
            BlockTx::new(vec![TestMsg::send("a")]),
            BlockTx::new(vec![TestMsg::send("a")]),
        ];
        let dag = resolver.build_dependency_dag(&txs).unwrap();

        resolver.tx_gate(&dag, 0).wait().await.unwrap();
        let err = resolver.tx_gate(&dag, 1).wait().await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::SignalTimeout {
                tx_index: 1,
                timeout_ms: 20,
                ..
            }
        ));
        assert_eq!(
            resolver.metrics().counter(&MetricKey::new(names::SIGNAL_WAIT_TIMEOUT)),
            Some(1)
        );
    }

    #[test]
    fn test_ante_ops_deduplicated() {
        let resolver = resolver();
        resolver
            .set_mapping(MessageDependencyMapping::new("bank/MsgSend", static_send_ops()))
            .unwrap();
        let fee = AccessOperation::write(ResourceType::KvAuthAddressStore, "payer");
        let txs = vec![BlockTx::new(vec![TestMsg::send("a")])
            .with_ante_ops(vec![fee.clone(), fee.clone(), fee])];

        let dag = resolver.build_dependency_dag(&txs).unwrap();
        assert_eq!(dag.node_count(), 3);
        assert_eq!(dag.nodes()[0].message_index, ANTE_MSG_INDEX);
        assert_eq!(dag.access_ops_for_msg(0, 0).unwrap(), static_send_ops().as_slice());
    }

    #[test]
    fn test_invalid_ante_op_rejected() {
        let resolver = resolver();
        let txs = vec![BlockTx::new(vec![TestMsg::send("a")])
            .with_ante_ops(vec![AccessOperation::write(ResourceType::KvBank, "payer")])];
        assert!(matches!(
            resolver.build_dependency_dag(&txs),
            Err(SchedulerError::InvalidAccessOp(_))
        ));
    }

    #[test]
    fn test_governance_message_rejected() {
        let resolver = resolver();
        let vote = TestMsg {
            key: "gov/MsgVote",
            governance: true,
            target: "",
        };
        let txs = vec![
            BlockTx::new(vec![TestMsg::send("a")]),
            BlockTx::new(vec![vote.clone()]),
        ];
        let err = resolver.build_dependency_dag(&txs).unwrap_err();
        assert!(matches!(err, SchedulerError::GovMsgInBlock { tx_index: 1, .. }));

        let permissive = DependencyResolver::with_metrics(
            SchedulerConfig {
                reject_governance_messages: false,
                ..Default::default()
            },
            Arc::new(Metrics::new()),
        );
        assert!(permissive.build_dependency_dag(&txs).is_ok());
    }

    #[test]
    fn test_metrics_disabled() {
        let resolver = DependencyResolver::<TestMsg>::with_metrics(
            SchedulerConfig {
                record_metrics: false,
                ..Default::default()
            },
            Arc::new(Metrics::new()),
        );
        resolver
            .build_dependency_dag(&[BlockTx::new(vec![TestMsg::send("a")])])
            .unwrap();
        assert!(resolver
            .metrics()
            .histogram(&MetricKey::new(names::DAG_BUILD_DURATION_MS))
            .is_none());
    }
}
