//! Thread-safe metrics registry

use crate::{Histogram, MetricKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Counters, gauges and histograms keyed by [`MetricKey`]
pub struct Metrics {
    histograms: RwLock<HashMap<MetricKey, Arc<Histogram>>>,
    counters: RwLock<HashMap<MetricKey, Arc<AtomicU64>>>,
    gauges: RwLock<HashMap<MetricKey, Arc<AtomicI64>>>,
}

static GLOBAL_METRICS: OnceLock<Arc<Metrics>> = OnceLock::new();

/// Lookup-or-insert under a read lock first, upgrading to a write lock on miss
fn get_or_create<T>(
    map: &RwLock<HashMap<MetricKey, Arc<T>>>,
    key: &MetricKey,
    create: impl FnOnce() -> T,
) -> Arc<T> {
    if let Some(existing) = map.read().get(key) {
        return Arc::clone(existing);
    }
    let mut map = map.write();
    Arc::clone(
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(create())),
    )
}

impl Metrics {
    /// Create a new metrics store
    pub fn new() -> Self {
        Self {
            histograms: RwLock::new(HashMap::new()),
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry
    pub fn global() -> Arc<Metrics> {
        Arc::clone(GLOBAL_METRICS.get_or_init(|| Arc::new(Metrics::new())))
    }

    /// Record a histogram observation
    pub fn observe(&self, key: impl Into<MetricKey>, value: f64) {
        let key = key.into();
        get_or_create(&self.histograms, &key, Histogram::new).observe(value);
    }

    /// Increment a counter
    pub fn increment(&self, key: impl Into<MetricKey>, delta: u64) {
        let key = key.into();
        get_or_create(&self.counters, &key, || AtomicU64::new(0))
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Set a gauge value
    pub fn set_gauge(&self, key: impl Into<MetricKey>, value: i64) {
        let key = key.into();
        get_or_create(&self.gauges, &key, || AtomicI64::new(0)).store(value, Ordering::Relaxed);
    }

    /// Counter value
    pub fn counter(&self, key: &MetricKey) -> Option<u64> {
        self.counters
            .read()
            .get(key)
            .map(|c| c.load(Ordering::Relaxed))
    }

    /// Gauge value
    pub fn gauge(&self, key: &MetricKey) -> Option<i64> {
        self.gauges
            .read()
            .get(key)
            .map(|g| g.load(Ordering::Relaxed))
    }

    /// Histogram handle
    pub fn histogram(&self, key: &MetricKey) -> Option<Arc<Histogram>> {
        self.histograms.read().get(key).cloned()
    }

    /// Sum of every counter named `name`, across all label sets
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .read()
            .iter()
            .filter(|(k, _)| k.name() == name)
            .map(|(_, v)| v.load(Ordering::Relaxed))
            .sum()
    }

    pub(crate) fn all_counters(&self) -> Vec<(MetricKey, u64)> {
        self.counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    pub(crate) fn all_gauges(&self) -> Vec<(MetricKey, i64)> {
        self.gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    pub(crate) fn all_histograms(&self) -> Vec<(MetricKey, Arc<Histogram>)> {
        self.histograms
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
