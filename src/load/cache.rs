//! Match cache and garbage collection.
//!
//! Matches leaving the active chain are parked in `cached_matches` so a quick
//! back-navigation can serve their data while revalidating. Entries expire by
//! age against the route's gc time.

use crate::config::schema::RouterConfig;
use crate::matches::{MatchStatus, RouteMatch};
use crate::routing::tree::RouteTree;
use std::time::Duration;
use tokio::time::Instant;

/// GC window for a cached match.
pub fn gc_time(tree: &RouteTree, config: &RouterConfig, m: &RouteMatch) -> Duration {
    let options = &tree.node(m.route).options;
    if m.preload {
        options.preload_gc_time.unwrap_or_else(|| config.preload_gc_time())
    } else {
        options.gc_time.unwrap_or_else(|| config.gc_time())
    }
}

/// Errors and routes without loaders have nothing worth keeping.
pub fn is_expired(tree: &RouteTree, config: &RouterConfig, m: &RouteMatch, now: Instant) -> bool {
    if m.status == MatchStatus::Error || !tree.node(m.route).has_loader() {
        return true;
    }
    now.saturating_duration_since(m.updated_at) >= gc_time(tree, config, m)
}

/// Cache after dropping expired entries, or `None` when nothing expired.
pub fn sweep(tree: &RouteTree, config: &RouterConfig, cached: &[RouteMatch], now: Instant) -> Option<Vec<RouteMatch>> {
    if !cached.iter().any(|m| is_expired(tree, config, m, now)) {
        return None;
    }
    Some(
        cached
            .iter()
            .filter(|m| !is_expired(tree, config, m, now))
            .cloned()
            .collect(),
    )
}

/// Park matches that left the active chain.
///
/// Failed matches are dropped, and an exiting match replaces any cached entry
/// with the same id.
pub fn retire(cached: &[RouteMatch], exiting: impl IntoIterator<Item = RouteMatch>) -> Vec<RouteMatch> {
    let exiting: Vec<RouteMatch> = exiting
        .into_iter()
        .filter(|m| m.status != MatchStatus::Error)
        .collect();
    let mut kept: Vec<RouteMatch> = cached
        .iter()
        .filter(|c| !exiting.iter().any(|e| e.id == c.id))
        .cloned()
        .collect();
    kept.extend(exiting);
    kept
}
