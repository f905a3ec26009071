//! Router subsystem.
//!
//! # Data Flow
//! ```text
//! navigate(BuildOptions)
//!     → build_location → commit_location → History push/replace
//!     → history listener → start_load (generation += 1, spawn)
//!     → run_load:
//!         parse history location
//!         cancel previous pending matches
//!         emit BeforeLoad
//!         match_routes → state.pending_matches
//!         LoadEngine::load_matches
//!         superseded? → await the latest load instead
//!         redirect?   → replace-navigate, await the latest load
//!         commit: matches = pending, exiting → cache, hooks, GC
//!         emit Load, Resolved
//! ```
//!
//! # Design Decisions
//! - State is an `ArcSwap<RouterState>` replaced whole; readers hold
//!   immutable snapshots
//! - Each load is a spawned task tagged with a generation; only the newest
//!   generation may write pending matches or commit
//! - History is the single source of truth; navigation only ever writes to it

pub mod events;
pub mod state;

use crate::config::schema::RouterConfig;
use crate::config::validation::validate_router_config;
use crate::error::{Redirect, RouterError};
use crate::history::{History, MemoryHistory, Subscription};
use crate::load::{cache, LoadEngine, LoadOutcome, LoadRequest, MatchStore};
use crate::location::mask::masked_history_state;
use crate::location::{
    parse_location, BuildOptions, JsonSearchSerializer, LocationBuilder, ParsedLocation, RouteMask,
    SearchSerializer, Updater,
};
use crate::matches::{match_routes, MatchRoutesOptions, MatchStatus, RouteMatch};
use crate::observability::metrics;
use crate::routing::matcher::{match_pathname, MatchLocation};
use crate::routing::tree::RouteTree;
use crate::value::{partial_deep_equal, Value};
use arc_swap::ArcSwap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub use events::{RouterEvent, RouterEventKind};
pub use state::{RouterState, RouterStatus};

type SharedLoad = Shared<BoxFuture<'static, ()>>;

/// Redirect hops a single preload will follow.
const MAX_PRELOAD_REDIRECTS: usize = 8;

/// Options for [`Router::match_route`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchRouteOptions {
    /// Compare against the location being loaded (`true`) or the resolved one.
    /// Defaults to the location being loaded when idle.
    pub pending: Option<bool>,
    pub case_sensitive: Option<bool>,
    /// Also match when the pathname continues past the route.
    pub fuzzy: bool,
    /// Require the destination's search to be contained in the location's. Default `true`.
    pub include_search: Option<bool>,
}

/// Loader data of one match, keyed by match id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedMatch {
    pub id: String,
    pub status: MatchStatus,
    pub loader_data: Option<Value>,
}

/// Serializable snapshot used to seed a router with already-loaded data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DehydratedRouter {
    pub matches: Vec<DehydratedMatch>,
}

/// Builder for [`Router`].
pub struct RouterBuilder {
    tree: RouteTree,
    history: Option<Arc<dyn History>>,
    config: RouterConfig,
    context: Value,
    masks: Vec<RouteMask>,
    serializer: Arc<dyn SearchSerializer>,
}

impl RouterBuilder {
    pub fn history(mut self, history: Arc<dyn History>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Context handed to the root guard.
    pub fn context(mut self, context: impl Into<Value>) -> Self {
        self.context = context.into();
        self
    }

    pub fn route_mask(mut self, mask: RouteMask) -> Self {
        self.masks.push(mask);
        self
    }

    pub fn search_serializer(mut self, serializer: Arc<dyn SearchSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn build(self) -> Result<Router, RouterError> {
        validate_router_config(&self.config).map_err(RouterError::Config)?;

        let history = self
            .history
            .unwrap_or_else(|| Arc::new(MemoryHistory::new("/")));
        let temp_key = uuid::Uuid::new_v4().to_string();
        let location = parse_location(&history.location(), None, &*self.serializer, &temp_key);
        let tree = Arc::new(self.tree);

        let inner = Arc::new(RouterInner {
            engine: Arc::new(LoadEngine::new(tree.clone(), self.config.clone())),
            tree,
            config: self.config,
            history: history.clone(),
            serializer: self.serializer,
            masks: self.masks,
            context: if self.context.is_object() { self.context } else { Value::object() },
            temp_key,
            state: ArcSwap::from_pointee(RouterState::new(location)),
            generation: AtomicU64::new(0),
            latest_load: Mutex::new(None),
            events: events::EventBus::default(),
            history_subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = history.listen(Arc::new(move |location, action| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            tracing::debug!(href = %location.href(), ?action, "History changed");
            inner.start_load();
        }));
        *inner
            .history_subscription
            .lock()
            .expect("history subscription mutex poisoned") = Some(subscription);

        tracing::debug!(routes = inner.tree.len(), basepath = %inner.config.basepath, "Router created");
        Ok(Router { inner })
    }
}

/// Handle to a router. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    tree: Arc<RouteTree>,
    config: RouterConfig,
    history: Arc<dyn History>,
    serializer: Arc<dyn SearchSerializer>,
    masks: Vec<RouteMask>,
    context: Value,
    /// Ties masked history entries to this instance.
    temp_key: String,
    state: ArcSwap<RouterState>,
    generation: AtomicU64,
    latest_load: Mutex<Option<(u64, SharedLoad)>>,
    engine: Arc<LoadEngine>,
    events: events::EventBus,
    history_subscription: Mutex<Option<Subscription>>,
}

impl MatchStore for RouterInner {
    fn get_match(&self, id: &str) -> Option<RouteMatch> {
        self.state.load().find_match(id).cloned()
    }

    fn update_match(&self, id: &str, f: &dyn Fn(&mut RouteMatch)) {
        self.state.rcu(|state| match state.with_match(id, f) {
            Some(next) => Arc::new(next),
            None => state.clone(),
        });
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn is_cached(&self, id: &str) -> bool {
        self.state.load().is_cached(id)
    }

    fn update_cached(&self, id: &str, f: &dyn Fn(&mut RouteMatch)) -> bool {
        let mut written = false;
        self.state.rcu(|state| {
            written = false;
            match state.with_cached_match(id, f) {
                Some(next) => {
                    written = true;
                    Arc::new(next)
                }
                None => state.clone(),
            }
        });
        written
    }
}

impl RouterInner {
    /// Begin loading the current history location as the newest generation.
    fn start_load(self: &Arc<Self>) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("History changed outside a tokio runtime; load skipped");
            return;
        }

        let mut latest = self.latest_load.lock().expect("latest load mutex poisoned");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = self.clone();
        let task = tokio::spawn(async move { inner.run_load(generation).await });
        let shared = async move {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "Load task failed");
            }
        }
        .boxed()
        .shared();
        *latest = Some((generation, shared));
    }

    /// Wait until the newest load newer than `after` (and any load started
    /// while waiting) finishes.
    async fn await_latest(&self, after: u64) {
        loop {
            let current = self
                .latest_load
                .lock()
                .expect("latest load mutex poisoned")
                .clone();
            let Some((generation, load)) = current else {
                return;
            };
            if generation <= after {
                return;
            }
            load.await;
            if self.generation.load(Ordering::SeqCst) == generation {
                return;
            }
        }
    }

    fn location_builder(&self) -> LocationBuilder<'_> {
        LocationBuilder {
            tree: &self.tree,
            config: &self.config,
            serializer: &*self.serializer,
            masks: &self.masks,
        }
    }

    fn build_location(&self, dest: &BuildOptions) -> ParsedLocation {
        let state = self.state.load();
        let from_search = state
            .pending_matches
            .as_ref()
            .and_then(|pending| pending.last())
            .or_else(|| state.matches.last())
            .map(|m| m.search.clone())
            .unwrap_or_else(|| state.location.search.clone());
        self.location_builder().build(&state.location, &from_search, dest)
    }

    fn commit_location(&self, location: &ParsedLocation, replace: bool) -> Result<(), RouterError> {
        let (href, state) = match &location.masked_location {
            Some(masked) => {
                let unmask = location.unmask_on_reload.unwrap_or(self.config.unmask_on_reload);
                let key = unmask.then_some(self.temp_key.as_str());
                (masked.href.clone(), masked_history_state(location, masked, key))
            }
            None => (location.href.clone(), location.state.clone()),
        };

        let written = if replace {
            self.history.replace(&href, state)
        } else {
            self.history.push(&href, state)
        };
        if written {
            Ok(())
        } else {
            Err(RouterError::Blocked)
        }
    }

    /// Abort the guards and loaders of the navigation in progress. Background
    /// revalidation of committed matches keeps running.
    fn cancel_matches(&self) {
        let state = self.state.load();
        for m in state.pending_matches.iter().flatten() {
            m.abort.abort();
        }
    }

    async fn run_load(self: Arc<Self>, generation: u64) {
        let previous = self.state.load_full();
        let location = parse_location(
            &self.history.location(),
            Some(&previous.location),
            &*self.serializer,
            &self.temp_key,
        );

        self.cancel_matches();
        self.events.emit(&RouterEvent::new(
            RouterEventKind::BeforeLoad,
            previous.resolved_location.as_ref(),
            &location,
        ));

        let matches = match match_routes(
            &self.tree,
            &self.config,
            &previous,
            &location.pathname,
            &location.search,
            MatchRoutesOptions::default(),
        ) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::error!(error = %err, "Route matching failed");
                return;
            }
        };

        self.state.rcu(|state| {
            if !self.is_latest(generation) {
                return state.clone();
            }
            let mut next = (**state).clone();
            next.status = RouterStatus::Pending;
            next.is_loading = true;
            next.location = location.clone();
            next.cached_matches = state
                .cached_matches
                .iter()
                .filter(|c| !matches.iter().any(|m| m.id == c.id))
                .cloned()
                .collect();
            next.pending_matches = Some(matches.clone());
            Arc::new(next)
        });

        let ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
        let request = LoadRequest {
            location: location.clone(),
            matches,
            context: self.context.clone(),
            preload: false,
            generation,
        };
        let store: Arc<dyn MatchStore> = self.clone();
        let outcome = self.engine.load_matches(store, request).await;

        match outcome {
            LoadOutcome::Settled(ids) if self.is_latest(generation) => {
                self.commit_matches(&location, previous.resolved_location.as_ref(), &ids, generation);
            }
            LoadOutcome::Redirect(redirect) if self.is_latest(generation) => {
                tracing::info!(from = %location.href, to = %redirect.to, status = redirect.status, "Redirecting");
                let target = self.build_location(&BuildOptions::from(&redirect));
                match self.commit_location(&target, redirect.replace) {
                    Ok(()) => {
                        metrics::record_navigation("redirect");
                        self.await_latest(generation).await;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, to = %target.href, "Redirect was not committed");
                        self.commit_matches(&location, previous.resolved_location.as_ref(), &ids, generation);
                    }
                }
            }
            _ => {
                tracing::debug!(href = %location.href, generation, "Load superseded");
                metrics::record_navigation("superseded");
                self.await_latest(generation).await;
            }
        }
    }

    fn commit_matches(
        &self,
        location: &ParsedLocation,
        from: Option<&ParsedLocation>,
        ids: &[String],
        generation: u64,
    ) {
        let mut committed = false;
        let before = self.state.rcu(|state| {
            committed = self.is_latest(generation);
            if !committed {
                return state.clone();
            }
            let matches: Vec<RouteMatch> = ids
                .iter()
                .filter_map(|id| state.find_match(id).cloned())
                .collect();
            let exiting: Vec<RouteMatch> = state
                .matches
                .iter()
                .filter(|m| !matches.iter().any(|n| n.id == m.id))
                .cloned()
                .collect();
            let cached: Vec<RouteMatch> = state
                .cached_matches
                .iter()
                .filter(|c| !matches.iter().any(|m| m.id == c.id))
                .cloned()
                .collect();

            let mut next = (**state).clone();
            next.status_code = if matches.iter().any(|m| m.status == MatchStatus::NotFound) {
                404
            } else {
                200
            };
            next.cached_matches = cache::retire(&cached, exiting);
            next.matches = matches;
            next.pending_matches = None;
            next.status = RouterStatus::Idle;
            next.is_loading = false;
            next.location = location.clone();
            next.resolved_location = Some(location.clone());
            Arc::new(next)
        });
        if !committed {
            return;
        }

        let after = self.state.load_full();
        self.run_match_hooks(&before.matches, &after.matches);
        self.clear_expired_cache();

        let outcome = if after.status_code == 404 { "not_found" } else { "success" };
        metrics::record_navigation(outcome);
        tracing::info!(
            href = %location.href,
            matches = after.matches.len(),
            status = after.status_code,
            "Navigation committed"
        );

        self.events.emit(&RouterEvent::new(RouterEventKind::Load, from, location));
        self.events.emit(&RouterEvent::new(RouterEventKind::Resolved, from, location));
    }

    fn run_match_hooks(&self, before: &[RouteMatch], after: &[RouteMatch]) {
        for m in before.iter().filter(|m| !after.iter().any(|a| a.id == m.id)) {
            if let Some(on_leave) = &self.tree.node(m.route).options.on_leave {
                on_leave(m);
            }
        }
        for m in after {
            let options = &self.tree.node(m.route).options;
            let hook = if before.iter().any(|b| b.id == m.id) {
                &options.on_stay
            } else {
                &options.on_enter
            };
            if let Some(hook) = hook {
                hook(m);
            }
        }
    }

    fn clear_expired_cache(&self) {
        let now = Instant::now();
        self.state.rcu(|state| {
            match cache::sweep(&self.tree, &self.config, &state.cached_matches, now) {
                Some(kept) => {
                    let mut next = (**state).clone();
                    next.cached_matches = kept;
                    Arc::new(next)
                }
                None => state.clone(),
            }
        });
        metrics::record_cached_matches(self.state.load().cached_matches.len());
    }
}

impl Router {
    pub fn builder(tree: RouteTree) -> RouterBuilder {
        RouterBuilder {
            tree,
            history: None,
            config: RouterConfig::default(),
            context: Value::object(),
            masks: Vec::new(),
            serializer: Arc::new(JsonSearchSerializer),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<RouterState> {
        self.inner.state.load_full()
    }

    pub fn tree(&self) -> &RouteTree {
        &self.inner.tree
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    pub fn history(&self) -> Arc<dyn History> {
        self.inner.history.clone()
    }

    /// Load the current history location and wait for it to settle.
    pub async fn load(&self) {
        self.inner.start_load();
        self.inner.await_latest(0).await;
    }

    /// Resolve a pathname against the tree using the current state for reuse.
    pub fn match_routes(
        &self,
        pathname: &str,
        search: &Value,
        options: MatchRoutesOptions,
    ) -> Result<Vec<RouteMatch>, RouterError> {
        let state = self.inner.state.load();
        Ok(match_routes(
            &self.inner.tree,
            &self.inner.config,
            &state,
            pathname,
            search,
            options,
        )?)
    }

    pub fn build_location(&self, dest: &BuildOptions) -> ParsedLocation {
        self.inner.build_location(dest)
    }

    /// Active-link check: params of the current location if it matches `dest`.
    pub fn match_route(&self, dest: &BuildOptions, options: MatchRouteOptions) -> Option<Value> {
        let mut target = dest.clone();
        if matches!(target.params, Updater::Unset) {
            target.params = Updater::Set(Value::object());
        }
        let next = self.inner.build_location(&target);
        let state = self.inner.state.load();

        if options.pending == Some(true) && state.status != RouterStatus::Pending {
            return None;
        }
        let pending = options.pending.unwrap_or(!state.is_loading);
        let base = if pending {
            &state.location
        } else {
            state.resolved_location.as_ref().unwrap_or(&state.location)
        };

        let location = MatchLocation {
            to: Some(&next.pathname),
            case_sensitive: options.case_sensitive.unwrap_or(self.inner.config.case_sensitive),
            fuzzy: options.fuzzy,
        };
        let params = Value::from_pairs(match_pathname(&self.inner.config.basepath, &base.pathname, &location)?);

        if let Updater::Set(expected) = &dest.params {
            if !partial_deep_equal(&params, expected) {
                return None;
            }
        }
        if options.include_search.unwrap_or(true) && !partial_deep_equal(&base.search, &next.search) {
            return None;
        }
        Some(params)
    }

    /// Build `dest`, write it to history and wait for the resulting load.
    pub async fn navigate(&self, dest: BuildOptions) -> Result<(), RouterError> {
        if let Some(to) = dest.to.as_deref() {
            if url::Url::parse(to).is_ok() {
                return Err(RouterError::ExternalUrl(to.to_string()));
            }
        }
        let location = self.inner.build_location(&dest);
        self.commit_location(&location, dest.replace)?;
        self.inner.await_latest(0).await;
        Ok(())
    }

    /// Write `location` to history without waiting for the load.
    pub fn commit_location(&self, location: &ParsedLocation, replace: bool) -> Result<(), RouterError> {
        tracing::debug!(href = %location.href, replace, masked = location.masked_location.is_some(), "Committing location");
        self.inner.commit_location(location, replace)
    }

    /// Load the matches of `dest` into the cache without navigating.
    ///
    /// Matches that are already active or pending are left alone. Redirects
    /// are followed by preloading their target.
    pub async fn preload_route(&self, dest: BuildOptions) -> Result<Vec<RouteMatch>, RouterError> {
        let mut dest = dest;
        for _ in 0..MAX_PRELOAD_REDIRECTS {
            let next = self.inner.build_location(&dest);
            let state = self.inner.state.load_full();
            let matches = match_routes(
                &self.inner.tree,
                &self.inner.config,
                &state,
                &next.pathname,
                &next.search,
                MatchRoutesOptions {
                    throw_on_error: true,
                    preload: true,
                },
            )?;

            let first_new = matches
                .iter()
                .position(|m| !state.is_active(&m.id) && !state.is_pending(&m.id))
                .unwrap_or(matches.len());
            let context = first_new
                .checked_sub(1)
                .and_then(|i| state.find_match(&matches[i].id))
                .map(|m| m.context.clone())
                .unwrap_or_else(|| self.inner.context.clone());
            let to_load: Vec<RouteMatch> = matches[first_new..]
                .iter()
                .filter(|m| !state.is_active(&m.id) && !state.is_pending(&m.id))
                .cloned()
                .collect();

            self.inner.state.rcu(|state| {
                let mut next = (**state).clone();
                for m in &to_load {
                    if !next.cached_matches.iter().any(|c| c.id == m.id) {
                        next.cached_matches.push(m.clone());
                    }
                }
                Arc::new(next)
            });

            tracing::debug!(href = %next.href, matches = to_load.len(), "Preloading");
            let request = LoadRequest {
                location: next,
                matches: to_load,
                context,
                preload: true,
                generation: self.inner.generation.load(Ordering::SeqCst),
            };
            let store: Arc<dyn MatchStore> = self.inner.clone();
            match self.inner.engine.load_matches(store, request).await {
                LoadOutcome::Redirect(redirect) => {
                    dest = BuildOptions::from(&redirect);
                }
                LoadOutcome::Settled(_) | LoadOutcome::Superseded => {
                    let state = self.inner.state.load();
                    return Ok(matches
                        .iter()
                        .filter_map(|m| state.find_match(&m.id).cloned())
                        .collect());
                }
            }
        }

        tracing::warn!("Preload gave up after too many redirects");
        Ok(Vec::new())
    }

    /// Mark matches stale and reload the current location.
    ///
    /// Failed matches go back to pending so they load again.
    pub async fn invalidate(&self, filter: impl Fn(&RouteMatch) -> bool) {
        let invalidate = |m: &RouteMatch| {
            let mut m = m.clone();
            if filter(&m) {
                m.invalid = true;
                if m.status == MatchStatus::Error {
                    m.status = MatchStatus::Pending;
                    m.error = None;
                }
            }
            m
        };
        self.inner.state.rcu(|state| {
            let mut next = (**state).clone();
            next.matches = state.matches.iter().map(&invalidate).collect();
            next.cached_matches = state.cached_matches.iter().map(&invalidate).collect();
            next.pending_matches = state
                .pending_matches
                .as_ref()
                .map(|pending| pending.iter().map(&invalidate).collect());
            Arc::new(next)
        });
        self.load().await;
    }

    pub async fn invalidate_all(&self) {
        self.invalidate(|_| true).await;
    }

    pub fn subscribe(
        &self,
        kind: RouterEventKind,
        listener: impl Fn(&RouterEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.events.subscribe(kind, Arc::new(listener))
    }

    /// Drop cached matches whose gc time has passed.
    pub fn clear_expired_cache(&self) {
        self.inner.clear_expired_cache();
    }

    /// Drop cached matches accepted by `filter`.
    pub fn clear_cache_where(&self, filter: impl Fn(&RouteMatch) -> bool) {
        self.inner.state.rcu(|state| {
            let mut next = (**state).clone();
            next.cached_matches = state
                .cached_matches
                .iter()
                .filter(|m| !filter(m))
                .cloned()
                .collect();
            Arc::new(next)
        });
    }

    pub fn clear_cache(&self) {
        self.clear_cache_where(|_| true);
    }

    pub fn get_match(&self, id: &str) -> Option<RouteMatch> {
        self.inner.get_match(id)
    }

    /// Abort the guard or loader running for match `id`.
    pub fn cancel_match(&self, id: &str) {
        if let Some(m) = self.inner.get_match(id) {
            m.abort.abort();
        }
    }

    /// Abort every match of the navigation in progress.
    pub fn cancel_matches(&self) {
        self.inner.cancel_matches();
    }

    /// Loader data of the committed matches.
    pub fn dehydrate(&self) -> DehydratedRouter {
        let state = self.inner.state.load();
        DehydratedRouter {
            matches: state
                .matches
                .iter()
                .map(|m| DehydratedMatch {
                    id: m.id.clone(),
                    status: m.status,
                    loader_data: m.loader_data.clone(),
                })
                .collect(),
        }
    }

    /// Resolve the current location and seed its matches from `snapshot`.
    ///
    /// Seeded matches count as freshly loaded, so a following [`load`](Self::load)
    /// only refetches them once they go stale.
    pub fn hydrate(&self, snapshot: &DehydratedRouter) -> Result<(), RouterError> {
        let state = self.inner.state.load_full();
        let location = state.location.clone();
        let now = Instant::now();
        let matches: Vec<RouteMatch> = match_routes(
            &self.inner.tree,
            &self.inner.config,
            &state,
            &location.pathname,
            &location.search,
            MatchRoutesOptions::default(),
        )?
        .into_iter()
        .map(|mut m| {
            if let Some(seed) = snapshot.matches.iter().find(|d| d.id == m.id) {
                m.status = seed.status;
                m.loader_data = seed.loader_data.clone();
                m.updated_at = now;
                m.fetched_at = Some(now);
                m.fetched_deps = Some(m.loader_deps.clone());
            }
            m
        })
        .collect();

        tracing::debug!(matches = matches.len(), seeded = snapshot.matches.len(), "Hydrated");
        self.inner.state.rcu(|state| {
            let mut next = (**state).clone();
            next.matches = matches.clone();
            next.resolved_location = Some(location.clone());
            Arc::new(next)
        });
        Ok(())
    }
}

impl From<&Redirect> for BuildOptions {
    fn from(redirect: &Redirect) -> Self {
        let mut options = BuildOptions::to(redirect.to.clone()).replace(redirect.replace);
        options.from = redirect.from.clone();
        if let Some(params) = &redirect.params {
            options.params = Updater::Set(params.clone());
        }
        if let Some(search) = &redirect.search {
            options.search = Updater::Set(search.clone());
        }
        if let Some(hash) = &redirect.hash {
            options.hash = Updater::Set(hash.clone());
        }
        options
    }
}
