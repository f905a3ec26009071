//! Per-route callbacks and timing knobs.
//!
//! Everything a route may plug into matching, location building and loading
//! is an optional `Arc<dyn Fn ..>`, so route definitions stay cheap to clone
//! and the engine only ever sees trait objects.

use crate::error::{LoadError, RouteError};
use crate::load::signal::AbortSignal;
use crate::location::ParsedLocation;
use crate::matches::{MatchCause, RouteMatch};
use crate::value::Value;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Input to a route guard.
#[derive(Debug, Clone)]
pub struct GuardContext {
    pub route_id: String,
    pub match_id: String,
    pub params: Value,
    pub search: Value,
    /// Context accumulated from the router and every ancestor guard.
    pub context: Value,
    pub location: ParsedLocation,
    pub cause: MatchCause,
    pub preload: bool,
    pub signal: AbortSignal,
}

/// Input to a route loader.
#[derive(Debug, Clone)]
pub struct LoaderContext {
    pub route_id: String,
    pub match_id: String,
    pub params: Value,
    pub search: Value,
    /// Context including this route's own guard result.
    pub context: Value,
    pub deps: Value,
    pub location: ParsedLocation,
    pub cause: MatchCause,
    pub preload: bool,
    pub signal: AbortSignal,
}

/// Input to a `should_reload` predicate.
#[derive(Debug, Clone)]
pub struct ReloadContext {
    pub route_id: String,
    pub params: Value,
    pub search: Value,
    pub cause: MatchCause,
    /// Loader deps the cached data was fetched with, if it was ever fetched.
    pub previous_deps: Option<Value>,
    pub deps: Value,
    pub age: Duration,
    pub preload: bool,
}

pub type GuardFn =
    Arc<dyn Fn(GuardContext) -> BoxFuture<'static, Result<Option<Value>, LoadError>> + Send + Sync>;
pub type LoaderFn = Arc<dyn Fn(LoaderContext) -> BoxFuture<'static, Result<Value, LoadError>> + Send + Sync>;
pub type ParseParamsFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
pub type StringifyParamsFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type ValidateSearchFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
pub type SearchFilterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type LoaderDepsFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type ShouldReloadFn = Arc<dyn Fn(&ReloadContext) -> bool + Send + Sync>;
pub type ErrorHookFn = Arc<dyn Fn(&RouteError) -> Result<(), LoadError> + Send + Sync>;
pub type MatchHookFn = Arc<dyn Fn(&RouteMatch) + Send + Sync>;

/// Options attached to one route.
#[derive(Clone, Default)]
pub struct RouteOptions {
    pub path: Option<String>,
    pub id: Option<String>,
    pub case_sensitive: Option<bool>,

    pub parse_params: Option<ParseParamsFn>,
    pub stringify_params: Option<StringifyParamsFn>,
    pub validate_search: Option<ValidateSearchFn>,
    pub pre_search_filters: Vec<SearchFilterFn>,
    pub post_search_filters: Vec<SearchFilterFn>,
    pub loader_deps: Option<LoaderDepsFn>,

    pub before_load: Option<GuardFn>,
    pub loader: Option<LoaderFn>,
    pub should_reload: Option<ShouldReloadFn>,
    pub on_error: Option<ErrorHookFn>,
    pub on_enter: Option<MatchHookFn>,
    pub on_stay: Option<MatchHookFn>,
    pub on_leave: Option<MatchHookFn>,

    pub stale_time: Option<Duration>,
    pub preload_stale_time: Option<Duration>,
    pub gc_time: Option<Duration>,
    pub preload_gc_time: Option<Duration>,
    pub pending_ms: Option<Duration>,
    pub pending_min_ms: Option<Duration>,

    /// Route renders not-found content for its subtree.
    pub not_found_handler: bool,
}

impl fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteOptions")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("case_sensitive", &self.case_sensitive)
            .field("has_guard", &self.before_load.is_some())
            .field("has_loader", &self.loader.is_some())
            .field("stale_time", &self.stale_time)
            .field("gc_time", &self.gc_time)
            .field("not_found_handler", &self.not_found_handler)
            .finish_non_exhaustive()
    }
}
