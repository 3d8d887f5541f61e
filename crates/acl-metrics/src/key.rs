//! Metric identity: name plus sorted labels

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metric name with optional labels.
///
/// Labels are kept sorted so two keys built in different orders compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricKey {
    name: String,
    labels: BTreeMap<String, String>,
}

impl MetricKey {
    /// Key without labels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of label `key`
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

impl From<&str> for MetricKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.labels.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}=\"{v}\"")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_order_irrelevant() {
        let a = MetricKey::new("m").with_label("x", "1").with_label("y", "2");
        let b = MetricKey::new("m").with_label("y", "2").with_label("x", "1");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "m{x=\"1\",y=\"2\"}");
    }

    #[test]
    fn test_plain_key() {
        let key = MetricKey::from("requests");
        assert_eq!(key.to_string(), "requests");
        assert_eq!(key.name(), "requests");
        assert_eq!(key.label("x"), None);
    }
}
