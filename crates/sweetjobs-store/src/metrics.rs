//! Store metrics.
//!
//! - Query counters by operation, table and outcome
//! - Query latency histograms
//! - Transaction commit counters

use std::time::Instant;

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total store queries by operation, table and status.
    pub const QUERIES_TOTAL: &str = "store_queries_total";

    /// Query latency in seconds by operation.
    pub const QUERY_LATENCY_SECONDS: &str = "store_query_latency_seconds";

    /// Finished transactions by outcome.
    pub const TRANSACTIONS_TOTAL: &str = "store_transactions_total";
}

/// Record a finished query.
pub fn record_query(operation: &'static str, table: &'static str, ok: bool, started: Instant) {
    counter!(
        names::QUERIES_TOTAL,
        "operation" => operation,
        "table" => table,
        "status" => if ok { "ok" } else { "error" }
    )
    .increment(1);

    histogram!(
        names::QUERY_LATENCY_SECONDS,
        "operation" => operation
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record a committed transaction.
pub fn record_commit() {
    counter!(names::TRANSACTIONS_TOTAL, "outcome" => "commit").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_query("insert_parent", "jobs", true, Instant::now());
        record_commit();
    }
}
