//! Scheduler configuration

use crate::error::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Bound on a transaction's wait for its blocking signals; 0 waits forever
    #[serde(default = "default_signal_wait_timeout_ms")]
    pub signal_wait_timeout_ms: u64,
    /// Fail DAG construction when a block carries a governance message
    #[serde(default = "default_true")]
    pub reject_governance_messages: bool,
    /// Record build metrics
    #[serde(default = "default_true")]
    pub record_metrics: bool,
}

fn default_signal_wait_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            signal_wait_timeout_ms: default_signal_wait_timeout_ms(),
            reject_governance_messages: true,
            record_metrics: true,
        }
    }
}

impl SchedulerConfig {
    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> SchedulerResult<Self> {
        toml::from_str(content).map_err(|e| SchedulerError::Config(e.to_string()))
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchedulerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Signal wait bound, `None` when unbounded
    pub fn signal_wait_timeout(&self) -> Option<Duration> {
        (self.signal_wait_timeout_ms > 0)
            .then(|| Duration::from_millis(self.signal_wait_timeout_ms))
    }
}
