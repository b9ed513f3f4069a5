//! Metric names and recording helpers.
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder these are no-ops.

use std::time::Duration;

use crate::Granularity;

pub const QUERIES_TOTAL: &str = "step_counter_queries_total";
pub const QUERY_SECONDS: &str = "step_counter_query_seconds";
pub const AUTHORIZATION_FAILURES_TOTAL: &str = "step_counter_authorization_failures_total";
pub const GOAL_SAVES_TOTAL: &str = "step_counter_goal_saves_total";

pub fn record_query(kind: Granularity, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(QUERIES_TOTAL, "kind" => kind.as_str(), "outcome" => outcome).increment(1);
    metrics::histogram!(QUERY_SECONDS, "kind" => kind.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_authorization_failure() {
    metrics::counter!(AUTHORIZATION_FAILURES_TOTAL).increment(1);
}

pub fn record_goal_save(ok: bool) {
    let outcome = if ok { "saved" } else { "rejected" };
    metrics::counter!(GOAL_SAVES_TOTAL, "outcome" => outcome).increment(1);
}
