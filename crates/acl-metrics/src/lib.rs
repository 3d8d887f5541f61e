//! # acl-metrics
//!
//! Metrics for the parallel access-control scheduler.
//!
//! Features:
//! - Histogram for duration tracking
//! - Counters and gauges with labels
//! - JSON export

#![warn(missing_docs)]
#![warn(clippy::all)]

mod export;
mod histogram;
mod key;
mod registry;

pub use export::{HistogramSummary, MetricsSnapshot};
pub use histogram::{Histogram, DEFAULT_MS_BUCKETS};
pub use key::MetricKey;
pub use registry::Metrics;

/// Metric names emitted by the scheduler crates
pub mod names {
    /// Histogram: wall time of one block DAG build, in milliseconds
    pub const DAG_BUILD_DURATION_MS: &str = "acl_dag_build_duration_ms";
    /// Gauge: nodes in the last built DAG
    pub const DAG_NODE_COUNT: &str = "acl_dag_node_count";
    /// Gauge: edges in the last built DAG
    pub const DAG_EDGE_COUNT: &str = "acl_dag_edge_count";
    /// Counter: dynamic dependency generation fell back to static declarations
    pub const DYNAMIC_DEPENDENCY_FALLBACK: &str = "acl_dynamic_dependency_fallback";
    /// Counter: undeclared or mismatched accesses, labeled by access type and store key
    pub const ACCESS_OP_VALIDATION_FAIL: &str = "acl_access_op_validation_fail";
    /// Counter: a transaction gave up waiting on its blocking signals
    pub const SIGNAL_WAIT_TIMEOUT: &str = "acl_signal_wait_timeout";
}

/// Time a block and record its duration in milliseconds
#[macro_export]
macro_rules! timed {
    ($metrics:expr, $key:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        $metrics.observe($key, start.elapsed().as_secs_f64() * 1000.0);
        result
    }};
}
