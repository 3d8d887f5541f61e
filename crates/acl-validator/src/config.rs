//! Validator configuration

use crate::error::{ValidatorError, ValidatorResult};
use acl_types::StoreKeyPrefixTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Run validation after each message
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Identifiers exempt from checking in addition to the built-in list
    #[serde(default)]
    pub concurrent_safe_identifiers: Vec<String>,
    /// Extra key prefixes: store key -> resource type name -> hex prefix
    #[serde(default)]
    pub prefixes: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            concurrent_safe_identifiers: Vec::new(),
            prefixes: BTreeMap::new(),
        }
    }
}

impl ValidatorConfig {
    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> ValidatorResult<Self> {
        toml::from_str(content).map_err(|e| ValidatorError::Config(e.to_string()))
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ValidatorResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidatorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Built-in prefix table extended with the configured entries
    pub fn prefix_table(&self) -> ValidatorResult<StoreKeyPrefixTable> {
        let entries = self.prefixes.iter().flat_map(|(store_key, by_type)| {
            by_type
                .iter()
                .map(move |(name, hex)| (store_key.as_str(), name.as_str(), hex.as_str()))
        });
        Ok(StoreKeyPrefixTable::from_hex_entries(entries)?)
    }
}
