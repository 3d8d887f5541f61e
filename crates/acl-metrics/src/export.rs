//! Metrics export and snapshot functionality

use crate::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of all metrics at a point in time, keyed by rendered metric key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Counter values
    pub counters: BTreeMap<String, u64>,
    /// Gauge values
    pub gauges: BTreeMap<String, i64>,
    /// Histogram summaries
    pub histograms: BTreeMap<String, HistogramSummary>,
}

/// Summary of a histogram
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSummary {
    /// Mean value
    pub mean: f64,
    /// Sum of values
    pub sum: f64,
    /// Total observation count
    pub count: u64,
}

impl MetricsSnapshot {
    /// Create a snapshot from a Metrics instance
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let counters = metrics
            .all_counters()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let gauges = metrics
            .all_gauges()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let histograms = metrics
            .all_histograms()
            .into_iter()
            .map(|(k, h)| {
                let summary = HistogramSummary {
                    mean: h.mean(),
                    sum: h.sum(),
                    count: h.total_count(),
                };
                (k.to_string(), summary)
            })
            .collect();

        Self {
            counters,
            gauges,
            histograms,
        }
    }

    /// Export snapshot as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export snapshot as compact JSON string
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
