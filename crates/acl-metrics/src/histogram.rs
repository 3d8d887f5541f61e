//! Histogram implementation for duration tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Default bucket upper bounds, in milliseconds
pub const DEFAULT_MS_BUCKETS: &[f64] = &[
    0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0,
];

// Sum is accumulated in thousandths of the observed unit
const SUM_SCALE: f64 = 1000.0;

/// Histogram for tracking value distributions
pub struct Histogram {
    /// Bucket upper bounds
    buckets: Vec<f64>,
    /// Counts per bucket, plus one overflow slot
    counts: Vec<AtomicU64>,
    sum_scaled: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create histogram with millisecond buckets
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_MS_BUCKETS.to_vec())
    }

    /// Create histogram with custom buckets
    pub fn with_buckets(mut buckets: Vec<f64>) -> Self {
        buckets.sort_by(|a, b| a.total_cmp(b));
        let counts = (0..=buckets.len()).map(|_| AtomicU64::new(0)).collect();
        Histogram {
            buckets,
            counts,
            sum_scaled: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a value. Negative values are clamped to zero.
    pub fn observe(&self, value: f64) {
        let value = value.max(0.0);
        self.sum_scaled
            .fetch_add((value * SUM_SCALE) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let slot = self
            .buckets
            .iter()
            .position(|boundary| value <= *boundary)
            .unwrap_or(self.buckets.len());
        self.counts[slot].fetch_add(1, Ordering::Relaxed);
    }

    /// Mean of observed values
    pub fn mean(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.sum() / count as f64
    }

    /// Sum of observed values
    pub fn sum(&self) -> f64 {
        self.sum_scaled.load(Ordering::Relaxed) as f64 / SUM_SCALE
    }

    /// Get total count
    pub fn total_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// `(upper bound, count)` per bucket; the overflow bucket has bound `+inf`
    pub fn bucket_counts(&self) -> Vec<(f64, u64)> {
        self.buckets
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .zip(self.counts.iter().map(|c| c.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
