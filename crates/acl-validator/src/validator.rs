//! Post-execution check of declared accesses against observed ones

use crate::comparator::Comparator;
use crate::config::ValidatorConfig;
use crate::error::ValidatorResult;
use crate::event::StoreEvent;
use acl_metrics::Metrics;
use acl_types::{is_synchronous_access_ops, AccessOperation, StoreKeyPrefixTable};
use std::collections::HashSet;
use std::sync::Arc;

/// Validates the accesses a message performed against those it declared
pub struct MsgValidator {
    enabled: bool,
    prefixes: StoreKeyPrefixTable,
    safe_identifiers: HashSet<String>,
    metrics: Arc<Metrics>,
}

impl MsgValidator {
    /// Validator over `prefixes`, reporting to the global metrics store
    pub fn new(prefixes: StoreKeyPrefixTable) -> Self {
        Self::with_metrics(prefixes, Metrics::global())
    }

    /// Validator reporting to `metrics`
    pub fn with_metrics(prefixes: StoreKeyPrefixTable, metrics: Arc<Metrics>) -> Self {
        Self {
            enabled: true,
            prefixes,
            safe_identifiers: HashSet::new(),
            metrics,
        }
    }

    /// Validator built from configuration
    pub fn from_config(config: &ValidatorConfig, metrics: Arc<Metrics>) -> ValidatorResult<Self> {
        let mut validator = Self::with_metrics(config.prefix_table()?, metrics)
            .with_safe_identifiers(config.concurrent_safe_identifiers.iter().cloned());
        validator.enabled = config.enabled;
        Ok(validator)
    }

    /// Exempt additional identifiers from checking
    pub fn with_safe_identifiers(mut self, identifiers: impl IntoIterator<Item = String>) -> Self {
        self.safe_identifiers.extend(identifiers);
        self
    }

    /// Check if validation runs
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prefix table in use
    pub fn prefixes(&self) -> &StoreKeyPrefixTable {
        &self.prefixes
    }

    fn is_exempt(&self, comparator: &Comparator) -> bool {
        comparator.is_concurrent_safe_identifier()
            || self.safe_identifiers.contains(&comparator.identifier)
    }

    /// Observed accesses in `events` that no operation in `declared` covers
    pub fn validate_access_operations(
        &self,
        declared: &[AccessOperation],
        events: &[StoreEvent],
    ) -> HashSet<Comparator> {
        if !self.enabled || is_synchronous_access_ops(declared) {
            return HashSet::new();
        }
        self.missing(declared, Comparator::from_events(events))
    }

    /// [`validate_access_operations`](Self::validate_access_operations) over
    /// already parsed comparators
    pub fn validate_comparators(
        &self,
        declared: &[AccessOperation],
        comparators: &[Comparator],
    ) -> HashSet<Comparator> {
        if !self.enabled || is_synchronous_access_ops(declared) {
            return HashSet::new();
        }
        self.missing(declared, comparators.iter().cloned())
    }

    fn missing(
        &self,
        declared: &[AccessOperation],
        comparators: impl IntoIterator<Item = Comparator>,
    ) -> HashSet<Comparator> {
        comparators
            .into_iter()
            .filter(|comparator| !self.is_exempt(comparator))
            .filter(|comparator| !self.is_declared(declared, comparator))
            .collect()
    }

    fn is_declared(&self, declared: &[AccessOperation], comparator: &Comparator) -> bool {
        declared.iter().any(|op| {
            self.prefixes
                .prefix(&comparator.store_key, op.resource_type)
                .is_some_and(|prefix| comparator.dependency_match(op, prefix))
        })
    }

    /// Log and count every undeclared access
    pub fn report_missing(&self, message_key: &str, missing: &HashSet<Comparator>) {
        if missing.is_empty() {
            return;
        }
        tracing::warn!(message_key, count = missing.len(), "undeclared accesses detected");
        for comparator in missing {
            tracing::info!(message_key, %comparator, "missing access operation");
            comparator.emit_validation_fail_metrics(&self.metrics);
        }
    }
}
