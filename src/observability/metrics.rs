//! Router metrics.
//!
//! # Metrics
//! - `router_navigations_total` (counter): committed loads by outcome
//! - `router_loader_runs_total` (counter): loader runs by route and outcome
//! - `router_loader_duration_seconds` (histogram): loader latency by route
//! - `router_cached_matches` (gauge): size of the match cache
//! - `router_redirects_total` (counter): redirects raised by guards and loaders

use std::time::Duration;

pub fn record_navigation(outcome: &'static str) {
    metrics::counter!("router_navigations_total", "outcome" => outcome).increment(1);
}

pub fn record_loader(route_id: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "router_loader_runs_total",
        "route" => route_id.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("router_loader_duration_seconds", "route" => route_id.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_cached_matches(count: usize) {
    metrics::gauge!("router_cached_matches").set(count as f64);
}

pub fn record_redirect(status: u16) {
    metrics::counter!("router_redirects_total", "status" => status.to_string()).increment(1);
}
