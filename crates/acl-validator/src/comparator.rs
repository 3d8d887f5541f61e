//! Observed-access comparator

use crate::event::{StoreEvent, ATTRIBUTE_ACCESS_TYPE, ATTRIBUTE_KEY, ATTRIBUTE_STORE_KEY};
use acl_metrics::{names, MetricKey, Metrics};
use acl_types::{AccessOperation, AccessType, WILDCARD_IDENTIFIER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store key whose entries only change through governance
pub const PARAMS_STORE_KEY: &str = "params";

/// Identifiers that only change through a globally serialized path
pub const CONCURRENT_SAFE_IDENTIFIERS: &[&str] = &[
    "bank/SendEnabled",
    "bank/DefaultSendEnabled",
    "staking/BondDenom",
    "auth/MaxMemoCharacters",
    "auth/TxSigLimit",
];

/// One observed store access, compared against declared operations
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Comparator {
    /// Observed access type
    pub access_type: AccessType,
    /// Hex-encoded key that was accessed
    pub identifier: String,
    /// Store the key lives in
    pub store_key: String,
}

impl Comparator {
    /// Create a comparator
    pub fn new(
        access_type: AccessType,
        identifier: impl Into<String>,
        store_key: impl Into<String>,
    ) -> Self {
        Self {
            access_type,
            identifier: identifier.into(),
            store_key: store_key.into(),
        }
    }

    /// Comparator for a resource-access event.
    ///
    /// Returns `None` for other events and for access events missing an
    /// attribute or carrying an unknown access type.
    pub fn from_event(event: &StoreEvent) -> Option<Self> {
        if !event.is_resource_access() {
            return None;
        }
        let identifier = event.attribute(ATTRIBUTE_KEY)?;
        let store_key = event.attribute(ATTRIBUTE_STORE_KEY)?;
        let access_type = match event.attribute(ATTRIBUTE_ACCESS_TYPE)?.parse() {
            Ok(access_type) => access_type,
            Err(e) => {
                tracing::debug!(error = %e, store_key, "skipping access event");
                return None;
            }
        };
        Some(Self::new(access_type, identifier, store_key))
    }

    /// Comparators for every resource-access event in `events`
    pub fn from_events(events: &[StoreEvent]) -> Vec<Self> {
        events.iter().filter_map(Self::from_event).collect()
    }

    /// Check if `declared` covers this access, given the declared resource's
    /// key prefix in this comparator's store
    pub fn dependency_match(&self, declared: &AccessOperation, prefix: &[u8]) -> bool {
        if declared.access_type != AccessType::Unknown && declared.access_type != self.access_type
        {
            return false;
        }
        if declared.identifier_template == WILDCARD_IDENTIFIER {
            return true;
        }
        let encoded = hex::encode(prefix);
        self.identifier.starts_with(&encoded)
            && declared.identifier_template.starts_with(&encoded)
            && self.identifier.contains(&declared.identifier_template)
    }

    /// Check if this access is exempt from dependency checking
    pub fn is_concurrent_safe_identifier(&self) -> bool {
        self.store_key == PARAMS_STORE_KEY
            || CONCURRENT_SAFE_IDENTIFIERS.contains(&self.identifier.as_str())
    }

    /// Count this access as undeclared
    pub fn emit_validation_fail_metrics(&self, metrics: &Metrics) {
        metrics.increment(
            MetricKey::new(names::ACCESS_OP_VALIDATION_FAIL)
                .with_label("access_type", self.access_type.as_str())
                .with_label("store_key", self.store_key.as_str()),
            1,
        );
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AccessType={}, Identifier={}, StoreKey={}",
            self.access_type, self.identifier, self.store_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl_types::ResourceType;

    fn observed(access_type: AccessType, identifier: &str) -> Comparator {
        Comparator::new(access_type, identifier, "bank")
    }

    // ==================== Event Parsing ====================

    #[test]
    fn test_from_events_skips_other_events() {
        let events = vec![
            StoreEvent::resource_access(AccessType::Read, "bank", &[0x02, 0x01]),
            StoreEvent::new("transfer", vec![]),
            StoreEvent::resource_access(AccessType::Write, "acc", &[0x01]),
        ];
        let comparators = Comparator::from_events(&events);
        assert_eq!(
            comparators,
            vec![
                Comparator::new(AccessType::Read, "0201", "bank"),
                Comparator::new(AccessType::Write, "01", "acc"),
            ]
        );
    }

    #[test]
    fn test_from_event_rejects_malformed() {
        let missing_store = StoreEvent::new(
            crate::event::RESOURCE_ACCESS_EVENT,
            vec![
                (ATTRIBUTE_KEY.to_string(), "01".to_string()),
                (ATTRIBUTE_ACCESS_TYPE.to_string(), "READ".to_string()),
            ],
        );
        assert_eq!(Comparator::from_event(&missing_store), None);

        let bad_access = StoreEvent::new(
            crate::event::RESOURCE_ACCESS_EVENT,
            vec![
                (ATTRIBUTE_KEY.to_string(), "01".to_string()),
                (ATTRIBUTE_ACCESS_TYPE.to_string(), "PEEK".to_string()),
                (ATTRIBUTE_STORE_KEY.to_string(), "bank".to_string()),
            ],
        );
        assert_eq!(Comparator::from_event(&bad_access), None);
    }

    // ==================== Dependency Match ====================

    #[test]
    fn test_match_contained_identifier() {
        let declared = AccessOperation::read(ResourceType::KvBankBalances, "0aabc/defg");
        let comparator = observed(AccessType::Read, "0aabc/defg/e");
        assert!(comparator.dependency_match(&declared, &[0x0a]));
    }

    #[test]
    fn test_unprefixed_identifiers_do_not_match() {
        // Containment alone is not enough when neither side carries the prefix
        let declared = AccessOperation::write(ResourceType::Kv, "abc/defg");
        let comparator = Comparator::new(AccessType::Write, "abc/defg/e", "storekey");
        assert!(!comparator.dependency_match(&declared, &[0x0a]));
        // The same strings match once the prefix is empty or present on both sides
        assert!(comparator.dependency_match(&declared, &[]));
        let prefixed = Comparator::new(AccessType::Write, "0aabc/defg/e", "storekey");
        let declared = AccessOperation::write(ResourceType::Kv, "0aabc/defg");
        assert!(prefixed.dependency_match(&declared, &[0x0a]));
    }

    #[test]
    fn test_match_requires_prefix_on_both_sides() {
        let declared = AccessOperation::read(ResourceType::KvBankBalances, "abc");
        let comparator = observed(AccessType::Read, "0aabc");
        assert!(!comparator.dependency_match(&declared, &[0x0a]));

        let declared = AccessOperation::read(ResourceType::KvBankBalances, "0aabc");
        let comparator = observed(AccessType::Read, "0babc");
        assert!(!comparator.dependency_match(&declared, &[0x0a]));
    }

    #[test]
    fn test_match_access_type() {
        let write = AccessOperation::write(ResourceType::KvBankBalances, "02ff");
        let unknown = AccessOperation::unknown(ResourceType::KvBankBalances, "02ff");
        let comparator = observed(AccessType::Read, "02ff");
        assert!(!comparator.dependency_match(&write, &[0x02]));
        assert!(comparator.dependency_match(&unknown, &[0x02]));
    }

    #[test]
    fn test_wildcard_matches_any_identifier() {
        let declared = AccessOperation::write(ResourceType::KvBank, WILDCARD_IDENTIFIER);
        let comparator = observed(AccessType::Write, "ffff");
        assert!(comparator.dependency_match(&declared, &[0x02]));
    }

    #[test]
    fn test_empty_prefix_matches_by_containment() {
        let declared = AccessOperation::read(ResourceType::Kv, "beef");
        assert!(observed(AccessType::Read, "00beef00").dependency_match(&declared, &[]));
        assert!(!observed(AccessType::Read, "00be00").dependency_match(&declared, &[]));
    }

    // ==================== Safety & Metrics ====================

    #[test]
    fn test_concurrent_safe_identifiers() {
        assert!(Comparator::new(AccessType::Read, "anything", PARAMS_STORE_KEY)
            .is_concurrent_safe_identifier());
        assert!(observed(AccessType::Read, "bank/SendEnabled").is_concurrent_safe_identifier());
        assert!(!observed(AccessType::Read, "0201").is_concurrent_safe_identifier());
    }

    #[test]
    fn test_emit_validation_fail_metrics() {
        let metrics = Metrics::new();
        let comparator = observed(AccessType::Write, "0201");
        comparator.emit_validation_fail_metrics(&metrics);
        comparator.emit_validation_fail_metrics(&metrics);

        let key = MetricKey::new(names::ACCESS_OP_VALIDATION_FAIL)
            .with_label("access_type", "WRITE")
            .with_label("store_key", "bank");
        assert_eq!(metrics.counter(&key), Some(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            observed(AccessType::Read, "02").to_string(),
            "AccessType=READ, Identifier=02, StoreKey=bank"
        );
    }
}
