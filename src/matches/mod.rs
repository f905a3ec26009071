//! Route matches.
//!
//! # Data Flow
//! ```text
//! pathname + search
//!     → resolver.rs (ranked lookup, branch walk, params, search validation)
//!     → Vec<RouteMatch> root-first
//!     → load engine drives each match through its status lifecycle
//! ```
//!
//! # Design Decisions
//! - A match is identified by its route id with params and loader deps filled
//!   in; equal ids mean "the same match" across navigations
//! - Matches are plain values; the router replaces them copy-on-write

pub mod resolver;

use crate::error::RouteError;
use crate::load::signal::AbortController;
use crate::routing::tree::RouteId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub use resolver::{match_routes, resolve_branch, Branch, MatchRoutesOptions};

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Pending,
    Success,
    Error,
    Redirected,
    NotFound,
}

/// Whether a match was already active before the current navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchCause {
    Enter,
    Stay,
}

/// One route's participation in a resolved location.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub id: String,
    pub route_id: String,
    pub route: RouteId,
    /// Depth in the chain, root is 0.
    pub index: usize,
    pub pathname: String,
    pub params: Value,
    pub search: Value,
    pub params_error: Option<RouteError>,
    pub search_error: Option<RouteError>,
    pub status: MatchStatus,
    pub is_fetching: bool,
    pub invalid: bool,
    pub show_pending: bool,
    pub loader_data: Option<Value>,
    pub loader_deps: Value,
    /// Deps the current loader data was fetched with.
    pub fetched_deps: Option<Value>,
    pub context: Value,
    pub error: Option<RouteError>,
    pub cause: MatchCause,
    /// Created by a preload and not yet adopted by a navigation.
    pub preload: bool,
    /// Not-found content for unmatched path segments renders here.
    pub global_not_found: bool,
    pub updated_at: Instant,
    /// Last time the loader settled successfully.
    pub fetched_at: Option<Instant>,
    pub abort: AbortController,
}

impl RouteMatch {
    pub fn new(id: String, route_id: String, route: RouteId, index: usize) -> Self {
        Self {
            id,
            route_id,
            route,
            index,
            pathname: "/".to_string(),
            params: Value::object(),
            search: Value::object(),
            params_error: None,
            search_error: None,
            status: MatchStatus::Pending,
            is_fetching: false,
            invalid: false,
            show_pending: false,
            loader_data: None,
            loader_deps: Value::Null,
            fetched_deps: None,
            context: Value::object(),
            error: None,
            cause: MatchCause::Enter,
            preload: false,
            global_not_found: false,
            updated_at: Instant::now(),
            fetched_at: None,
            abort: AbortController::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MatchStatus::Success
    }

    /// Settled in a state that still renders (success or not-found).
    pub fn is_settled(&self) -> bool {
        !matches!(self.status, MatchStatus::Pending) && !self.is_fetching
    }
}
