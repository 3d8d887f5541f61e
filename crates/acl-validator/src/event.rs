//! Resource-access events reported by the store layer

use acl_types::AccessType;
use serde::{Deserialize, Serialize};

/// Event type of an observed store access
pub const RESOURCE_ACCESS_EVENT: &str = "resource_access";

/// Attribute holding the hex-encoded key
pub const ATTRIBUTE_KEY: &str = "key";

/// Attribute holding the access type name
pub const ATTRIBUTE_ACCESS_TYPE: &str = "access_type";

/// Attribute holding the store key
pub const ATTRIBUTE_STORE_KEY: &str = "store_key";

/// Event emitted by the store layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Event type
    pub event_type: String,
    /// Attributes in emission order
    pub attributes: Vec<(String, String)>,
}

impl StoreEvent {
    /// Create an event
    pub fn new(event_type: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        Self {
            event_type: event_type.into(),
            attributes,
        }
    }

    /// Event for one observed access to `key` (raw bytes) in `store_key`
    pub fn resource_access(access_type: AccessType, store_key: &str, key: &[u8]) -> Self {
        Self::new(
            RESOURCE_ACCESS_EVENT,
            vec![
                (ATTRIBUTE_KEY.to_string(), hex::encode(key)),
                (ATTRIBUTE_ACCESS_TYPE.to_string(), access_type.to_string()),
                (ATTRIBUTE_STORE_KEY.to_string(), store_key.to_string()),
            ],
        )
    }

    /// First value of attribute `key`
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if this event reports a store access
    pub fn is_resource_access(&self) -> bool {
        self.event_type == RESOURCE_ACCESS_EVENT
    }
}
