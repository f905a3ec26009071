//! Guard and loader execution for one match chain.

use crate::config::schema::RouterConfig;
use crate::error::{LoadError, NotFound, Phase, Redirect, RouteError};
use crate::load::signal::AbortController;
use crate::load::MatchStore;
use crate::location::ParsedLocation;
use crate::matches::{MatchStatus, RouteMatch};
use crate::observability::metrics;
use crate::routing::options::{GuardContext, LoaderContext, ReloadContext};
use crate::routing::tree::{RouteNode, RouteTree};
use crate::value::{replace_equal_deep, Value};
use dashmap::DashMap;
use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// A loader run other callers can join.
#[derive(Clone)]
struct InFlight {
    fetch: SharedFetch,
    abort: AbortController,
}

/// How one match's guard or loader ended, as far as the chain is concerned.
#[derive(Debug, Clone)]
pub enum FetchResult {
    Done,
    /// The error is recorded on the match.
    Failed,
    Redirect(Redirect),
    NotFound(NotFound),
    Aborted,
}

/// A chain to load.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub location: ParsedLocation,
    /// Root first, as produced by the resolver.
    pub matches: Vec<RouteMatch>,
    /// Router context handed to the root guard.
    pub context: Value,
    pub preload: bool,
    pub generation: u64,
}

/// How loading a chain ended.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Ids of the chain to commit. A not-found cuts the chain at the route
    /// that renders it.
    Settled(Vec<String>),
    Redirect(Redirect),
    /// A newer navigation took over; nothing should be committed.
    Superseded,
}

enum GuardPhase {
    Complete,
    Stopped { index: usize, not_found: Option<NotFound> },
    Redirect(Redirect),
    Superseded,
}

/// Runs guards and loaders, deduplicating concurrent fetches by match id.
pub struct LoadEngine {
    tree: Arc<RouteTree>,
    config: RouterConfig,
    in_flight: DashMap<String, InFlight>,
}

impl LoadEngine {
    pub fn new(tree: Arc<RouteTree>, config: RouterConfig) -> Self {
        Self {
            tree,
            config,
            in_flight: DashMap::new(),
        }
    }

    /// Number of loader runs currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn is_current(&self, store: &dyn MatchStore, req: &LoadRequest) -> bool {
        req.preload || store.is_latest(req.generation)
    }

    /// Whether a preload lost `id` to a navigation.
    fn is_claimed(store: &dyn MatchStore, req: &LoadRequest, id: &str) -> bool {
        req.preload && !store.is_cached(id)
    }

    /// Write a match the request still owns.
    fn write_match(store: &dyn MatchStore, req: &LoadRequest, id: &str, f: &dyn Fn(&mut RouteMatch)) -> bool {
        if req.preload {
            store.update_cached(id, f)
        } else {
            store.update_match(id, f);
            true
        }
    }

    /// Drive every match of `req` through guards and loaders.
    pub async fn load_matches(self: &Arc<Self>, store: Arc<dyn MatchStore>, req: LoadRequest) -> LoadOutcome {
        let (end, mut not_found) = match self.run_guards(&store, &req).await {
            GuardPhase::Complete => (req.matches.len(), None),
            GuardPhase::Stopped { index, not_found } => (index, not_found.map(|nf| (index, nf))),
            GuardPhase::Redirect(redirect) => return LoadOutcome::Redirect(redirect),
            GuardPhase::Superseded => return LoadOutcome::Superseded,
        };

        let fetches = req.matches[..end]
            .iter()
            .map(|m| self.fetch_match(store.clone(), &req, &m.id));
        let results = join_all(fetches).await;

        if !self.is_current(&*store, &req) {
            return LoadOutcome::Superseded;
        }

        for (index, result) in results.into_iter().enumerate() {
            match result {
                FetchResult::Redirect(redirect) => return LoadOutcome::Redirect(redirect),
                FetchResult::NotFound(nf) => {
                    if not_found.as_ref().map_or(true, |(raised, _)| index < *raised) {
                        not_found = Some((index, nf));
                    }
                }
                FetchResult::Done | FetchResult::Failed | FetchResult::Aborted => {}
            }
        }

        let mut ids: Vec<String> = req.matches.iter().map(|m| m.id.clone()).collect();
        // matches below a stopped guard never ran
        ids.truncate(end + 1);

        if let Some((raised, nf)) = not_found {
            let owner = self.not_found_owner(&req.matches, raised, &nf);
            let error = RouteError::NotFound(nf);
            Self::write_match(&*store, &req, &ids[owner], &|m| {
                m.status = MatchStatus::NotFound;
                m.error = Some(error.clone());
                m.is_fetching = false;
                m.show_pending = false;
            });
            tracing::debug!(
                route_id = %req.matches[owner].route_id,
                raised_by = %req.matches[raised].route_id,
                "Not-found attributed"
            );
            ids.truncate(owner + 1);
        }

        if !req.preload {
            for m in req.matches.iter().filter(|m| m.global_not_found) {
                store.update_match(&m.id, &|m| {
                    if matches!(m.status, MatchStatus::Success | MatchStatus::Pending) {
                        m.status = MatchStatus::NotFound;
                        m.error = Some(RouteError::NotFound(NotFound {
                            global: true,
                            ..NotFound::default()
                        }));
                    }
                });
            }
        }

        LoadOutcome::Settled(ids)
    }

    /// Index of the match that renders a not-found raised at `raised`.
    fn not_found_owner(&self, chain: &[RouteMatch], raised: usize, nf: &NotFound) -> usize {
        let reachable = &chain[..=raised];
        let named = nf
            .route_id
            .as_deref()
            .and_then(|route_id| reachable.iter().position(|m| m.route_id == route_id));

        named.unwrap_or_else(|| {
            reachable
                .iter()
                .rposition(|m| self.tree.node(m.route).options.not_found_handler)
                .unwrap_or(0)
        })
    }

    async fn run_guards(&self, store: &Arc<dyn MatchStore>, req: &LoadRequest) -> GuardPhase {
        let mut context = req.context.clone();

        for (index, snapshot) in req.matches.iter().enumerate() {
            if Self::is_claimed(&**store, req, &snapshot.id) {
                return GuardPhase::Superseded;
            }
            let node = self.tree.node(snapshot.route);

            let invalid_input = snapshot
                .params_error
                .clone()
                .or_else(|| snapshot.search_error.clone());
            if let Some(error) = invalid_input {
                return match self.settle_failure(&**store, snapshot, error) {
                    FetchResult::Redirect(redirect) => GuardPhase::Redirect(redirect),
                    FetchResult::NotFound(nf) => GuardPhase::Stopped { index, not_found: Some(nf) },
                    _ => GuardPhase::Stopped { index, not_found: None },
                };
            }

            let controller = AbortController::new();
            let parent_context = context.clone();
            let installed = Self::write_match(&**store, req, &snapshot.id, &|m| {
                m.abort = controller.clone();
                m.context = parent_context.clone();
                m.preload = req.preload;
            });
            if !installed {
                return GuardPhase::Superseded;
            }

            let Some(guard) = node.options.before_load.clone() else {
                continue;
            };

            let signal = controller.signal();
            let guard_context = GuardContext {
                route_id: node.id.clone(),
                match_id: snapshot.id.clone(),
                params: snapshot.params.clone(),
                search: snapshot.search.clone(),
                context: context.clone(),
                location: req.location.clone(),
                cause: snapshot.cause,
                preload: req.preload,
                signal: controller.signal(),
            };
            let result = tokio::select! {
                result = guard(guard_context) => Some(result),
                _ = signal.aborted() => None,
            };

            if !self.is_current(&**store, req) || Self::is_claimed(&**store, req, &snapshot.id) {
                return GuardPhase::Superseded;
            }

            match result {
                None => {
                    let cancelled = RouteError::Cancelled {
                        route_id: node.id.clone(),
                    };
                    Self::write_match(&**store, req, &snapshot.id, &|m| {
                        m.status = MatchStatus::Error;
                        m.error = Some(cancelled.clone());
                        m.is_fetching = false;
                        m.show_pending = false;
                    });
                    tracing::debug!(route_id = %node.id, match_id = %snapshot.id, "Guard cancelled");
                    return GuardPhase::Stopped { index, not_found: None };
                }
                Some(Ok(extra)) => {
                    if let Some(extra) = extra {
                        context = context.merge(&extra);
                        let merged = context.clone();
                        Self::write_match(&**store, req, &snapshot.id, &|m| m.context = merged.clone());
                    }
                }
                Some(Err(err)) => {
                    let error = RouteError::from_load(&node.id, Phase::Guard, err);
                    return match self.settle_failure(&**store, snapshot, error) {
                        FetchResult::Redirect(redirect) => GuardPhase::Redirect(redirect),
                        FetchResult::NotFound(nf) => GuardPhase::Stopped { index, not_found: Some(nf) },
                        _ => GuardPhase::Stopped { index, not_found: None },
                    };
                }
            }
        }

        GuardPhase::Complete
    }

    async fn fetch_match(self: &Arc<Self>, store: Arc<dyn MatchStore>, req: &LoadRequest, id: &str) -> FetchResult {
        if Self::is_claimed(&*store, req, id) {
            return FetchResult::Done;
        }
        let Some(current) = store.get_match(id) else {
            return FetchResult::Done;
        };

        let running = self.in_flight.get(id).map(|entry| entry.value().clone());
        if let Some(running) = running {
            if current.status == MatchStatus::Success && !running.abort.is_aborted() {
                // already revalidating; keep serving the cached data
                return FetchResult::Done;
            }
            match running.fetch.await {
                FetchResult::Aborted => {
                    Self::write_match(&*store, req, id, &|m| {
                        m.is_fetching = false;
                        m.show_pending = false;
                    });
                }
                result => return result,
            }
        }

        let Some(current) = store.get_match(id) else {
            return FetchResult::Done;
        };
        let node = self.tree.node(current.route);

        if !node.has_loader() {
            let now = Instant::now();
            store.update_match(id, &|m| {
                m.status = MatchStatus::Success;
                m.error = None;
                m.invalid = false;
                m.updated_at = now;
            });
            return FetchResult::Done;
        }

        let age = Instant::now().saturating_duration_since(current.updated_at);
        let stale_after = if req.preload {
            node.options
                .preload_stale_time
                .unwrap_or_else(|| self.config.preload_stale_time())
        } else {
            node.options
                .stale_time
                .unwrap_or_else(|| self.config.stale_time())
        };
        let predicate = node.options.should_reload.as_ref().map(|should_reload| {
            should_reload(&ReloadContext {
                route_id: node.id.clone(),
                params: current.params.clone(),
                search: current.search.clone(),
                cause: current.cause,
                previous_deps: current.fetched_deps.clone(),
                deps: current.loader_deps.clone(),
                age,
                preload: req.preload,
            })
        });
        let needs_reload = current.invalid || predicate.unwrap_or(age >= stale_after);

        if current.status == MatchStatus::Success {
            if needs_reload {
                tracing::debug!(match_id = %id, age_ms = age.as_millis() as u64, "Revalidating in background");
                let fetch = self.start_fetch(store, req, &current, node, true);
                let engine = self.clone();
                let id = id.to_string();
                tokio::spawn(async move {
                    engine.complete(&id, fetch).await;
                });
            }
            return FetchResult::Done;
        }

        let fetch = self.start_fetch(store.clone(), req, &current, node, false);
        self.await_with_pending(&*store, req, &current, node, fetch).await
    }

    /// Start the loader for `m` and publish it as the in-flight fetch for its id.
    fn start_fetch(
        self: &Arc<Self>,
        store: Arc<dyn MatchStore>,
        req: &LoadRequest,
        m: &RouteMatch,
        node: &RouteNode,
        background: bool,
    ) -> SharedFetch {
        let engine = self.clone();
        let loader = node.options.loader.clone();
        let controller = m.abort.clone();
        let abort = m.abort.clone();
        let snapshot = m.clone();
        let loader_context = LoaderContext {
            route_id: m.route_id.clone(),
            match_id: m.id.clone(),
            params: m.params.clone(),
            search: m.search.clone(),
            context: m.context.clone(),
            deps: m.loader_deps.clone(),
            location: req.location.clone(),
            cause: m.cause,
            preload: req.preload,
            signal: controller.signal(),
        };

        let fetch = async move {
            let Some(loader) = loader else {
                return FetchResult::Done;
            };
            let id = snapshot.id.as_str();
            store.update_match(id, &|m| m.is_fetching = true);

            let started = Instant::now();
            let signal = controller.signal();
            let result = tokio::select! {
                result = loader(loader_context) => Some(result),
                _ = signal.aborted() => None,
            };
            let elapsed = started.elapsed();

            match result {
                None => {
                    store.update_match(id, &|m| {
                        if m.abort.same_as(&controller) {
                            m.is_fetching = false;
                            m.show_pending = false;
                        }
                    });
                    metrics::record_loader(&snapshot.route_id, "aborted", elapsed);
                    FetchResult::Aborted
                }
                Some(Ok(data)) => {
                    let now = Instant::now();
                    store.update_match(id, &|m| {
                        m.loader_data = Some(match &m.loader_data {
                            Some(previous) => replace_equal_deep(previous, data.clone()),
                            None => data.clone(),
                        });
                        m.status = MatchStatus::Success;
                        m.error = None;
                        m.is_fetching = false;
                        m.invalid = false;
                        m.updated_at = now;
                        m.fetched_at = Some(now);
                        m.fetched_deps = Some(snapshot.loader_deps.clone());
                    });
                    metrics::record_loader(&snapshot.route_id, "success", elapsed);
                    tracing::debug!(match_id = %id, elapsed_ms = elapsed.as_millis() as u64, "Loader finished");
                    FetchResult::Done
                }
                Some(Err(err)) if background && !matches!(err, LoadError::Failed(_)) => {
                    tracing::warn!(match_id = %id, error = %err, "Signal from background revalidation ignored");
                    store.update_match(id, &|m| m.is_fetching = false);
                    metrics::record_loader(&snapshot.route_id, "ignored", elapsed);
                    FetchResult::Done
                }
                Some(Err(err)) => {
                    metrics::record_loader(&snapshot.route_id, "error", elapsed);
                    let error = RouteError::from_load(&snapshot.route_id, Phase::Loader, err);
                    engine.settle_failure(&*store, &snapshot, error)
                }
            }
        };

        let fetch = fetch.boxed().shared();
        self.in_flight.insert(
            m.id.clone(),
            InFlight {
                fetch: fetch.clone(),
                abort,
            },
        );
        fetch
    }

    async fn complete(&self, id: &str, fetch: SharedFetch) -> FetchResult {
        let result = fetch.clone().await;
        self.in_flight.remove_if(id, |_, running| running.fetch.ptr_eq(&fetch));
        result
    }

    /// Await a blocking fetch, raising `show_pending` if it runs long.
    async fn await_with_pending(
        &self,
        store: &dyn MatchStore,
        req: &LoadRequest,
        m: &RouteMatch,
        node: &RouteNode,
        fetch: SharedFetch,
    ) -> FetchResult {
        let delay = if req.preload {
            None
        } else {
            node.options.pending_ms.or_else(|| self.config.pending_ms())
        };
        let completion = self.complete(&m.id, fetch);
        let Some(delay) = delay else {
            return completion.await;
        };
        let min_visible: Duration = node
            .options
            .pending_min_ms
            .unwrap_or_else(|| self.config.pending_min_ms());

        tokio::pin!(completion);
        tokio::select! {
            result = &mut completion => result,
            _ = tokio::time::sleep(delay) => {
                if store.is_latest(req.generation) {
                    store.update_match(&m.id, &|m| m.show_pending = true);
                }
                let shown = Instant::now();
                let result = completion.await;
                let visible = shown.elapsed();
                if visible < min_visible {
                    tokio::time::sleep(min_visible - visible).await;
                }
                store.update_match(&m.id, &|m| m.show_pending = false);
                result
            }
        }
    }

    /// Record a failure on `m`, giving the route's error hook first refusal.
    fn settle_failure(&self, store: &dyn MatchStore, m: &RouteMatch, error: RouteError) -> FetchResult {
        let node = self.tree.node(m.route);
        let error = match &node.options.on_error {
            Some(hook) if !error.is_redirect() && !error.is_not_found() => match hook(&error) {
                Ok(()) => error,
                Err(LoadError::Failed(message)) => with_message(error, message),
                Err(signal) => RouteError::from_load(&node.id, Phase::Loader, signal),
            },
            _ => error,
        };

        match error {
            RouteError::Redirect(redirect) => {
                let recorded = RouteError::Redirect(redirect.clone());
                store.update_match(&m.id, &|m| {
                    m.status = MatchStatus::Redirected;
                    m.error = Some(recorded.clone());
                    m.is_fetching = false;
                    m.show_pending = false;
                });
                metrics::record_redirect(redirect.status);
                tracing::debug!(route_id = %node.id, to = %redirect.to, "Redirect raised");
                FetchResult::Redirect(redirect)
            }
            RouteError::NotFound(nf) => {
                store.update_match(&m.id, &|m| {
                    m.is_fetching = false;
                    m.show_pending = false;
                });
                FetchResult::NotFound(nf)
            }
            error => {
                tracing::warn!(route_id = %node.id, match_id = %m.id, error = %error, "Route failed");
                store.update_match(&m.id, &|m| {
                    m.status = MatchStatus::Error;
                    m.error = Some(error.clone());
                    m.is_fetching = false;
                    m.show_pending = false;
                });
                FetchResult::Failed
            }
        }
    }
}

/// Same error kind with a message supplied by an error hook.
fn with_message(error: RouteError, message: String) -> RouteError {
    match error {
        RouteError::ParamParse { route_id, .. } => RouteError::ParamParse { route_id, message },
        RouteError::SearchValidation { route_id, .. } => RouteError::SearchValidation { route_id, message },
        RouteError::Guard { route_id, .. } => RouteError::Guard { route_id, message },
        RouteError::Loader { route_id, .. } => RouteError::Loader { route_id, message },
        signal => signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{match_routes, MatchRoutesOptions};
    use crate::router::state::RouterState;
    use crate::routing::tree::RouteDef;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TestStore {
        matches: Mutex<Vec<RouteMatch>>,
        generation: AtomicU64,
    }

    impl MatchStore for TestStore {
        fn get_match(&self, id: &str) -> Option<RouteMatch> {
            self.matches.lock().unwrap().iter().find(|m| m.id == id).cloned()
        }

        fn update_match(&self, id: &str, f: &dyn Fn(&mut RouteMatch)) {
            if let Some(m) = self.matches.lock().unwrap().iter_mut().find(|m| m.id == id) {
                f(m);
            }
        }

        fn is_latest(&self, generation: u64) -> bool {
            self.generation.load(Ordering::SeqCst) == generation
        }
    }

    struct Harness {
        engine: Arc<LoadEngine>,
        store: Arc<TestStore>,
        tree: Arc<RouteTree>,
    }

    impl Harness {
        fn new(root: RouteDef) -> Self {
            let tree = Arc::new(RouteTree::build(root).unwrap());
            let config = RouterConfig {
                default_pending_ms: None,
                ..Default::default()
            };
            Self {
                engine: Arc::new(LoadEngine::new(tree.clone(), config)),
                store: Arc::new(TestStore {
                    matches: Mutex::new(Vec::new()),
                    generation: AtomicU64::new(1),
                }),
                tree,
            }
        }

        fn request(&self, pathname: &str) -> LoadRequest {
            let matches = match_routes(
                &self.tree,
                &RouterConfig::default(),
                &RouterState::default(),
                pathname,
                &Value::object(),
                MatchRoutesOptions::default(),
            )
            .unwrap();
            *self.store.matches.lock().unwrap() = matches.clone();
            LoadRequest {
                location: ParsedLocation::new(pathname, Value::object(), String::new(), "", Value::object()),
                matches,
                context: Value::object().with("user", "ada"),
                preload: false,
                generation: 1,
            }
        }

        async fn load(&self, pathname: &str) -> LoadOutcome {
            let req = self.request(pathname);
            self.engine.load_matches(self.store.clone(), req).await
        }

        fn get(&self, id: &str) -> RouteMatch {
            self.store.get_match(id).unwrap()
        }
    }

    #[tokio::test]
    async fn test_context_flows_from_parent_guards() {
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("admin")
                .before_load(|ctx| async move {
                    assert_eq!(ctx.context.get("user"), Some(&Value::from("ada")));
                    Ok(Some(Value::object().with("role", "admin")))
                })
                .child(RouteDef::new("users").loader(|ctx| async move {
                    Ok(ctx.context.get("role").cloned().unwrap_or(Value::Null))
                })),
        ));

        let outcome = h.load("/admin/users").await;
        assert!(matches!(outcome, LoadOutcome::Settled(ref ids) if ids.len() == 3));
        let users = h.get("/admin/users");
        assert_eq!(users.status, MatchStatus::Success);
        assert_eq!(users.loader_data, Some(Value::from("admin")));
        assert_eq!(users.context.get("user"), Some(&Value::from("ada")));
    }

    #[tokio::test]
    async fn test_guard_redirect_stops_chain() {
        let child_ran = Arc::new(AtomicUsize::new(0));
        let counter = child_ran.clone();
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("private")
                .before_load(|_| async { Err(Redirect::to("/login").into()) })
                .child(RouteDef::new("page").loader(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Value::Null) }
                })),
        ));

        let outcome = h.load("/private/page").await;
        assert!(matches!(outcome, LoadOutcome::Redirect(ref r) if r.to == "/login"));
        assert_eq!(h.get("/private").status, MatchStatus::Redirected);
        assert_eq!(child_ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_loader_error_is_isolated() {
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("a")
                .loader(|_| async { Ok(Value::from("parent")) })
                .child(RouteDef::new("b").loader(|_| async { Err(LoadError::failed("db down")) })),
        ));

        let outcome = h.load("/a/b").await;
        assert!(matches!(outcome, LoadOutcome::Settled(_)));
        assert_eq!(h.get("/a").status, MatchStatus::Success);
        let failed = h.get("/a/b");
        assert_eq!(failed.status, MatchStatus::Error);
        assert!(matches!(failed.error, Some(RouteError::Loader { .. })));
    }

    #[tokio::test]
    async fn test_error_hook_can_redirect() {
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("a")
                .loader(|_| async { Err(LoadError::failed("expired")) })
                .on_error(|_| Err(Redirect::to("/login").into())),
        ));

        let outcome = h.load("/a").await;
        assert!(matches!(outcome, LoadOutcome::Redirect(_)));
        assert_eq!(h.get("/a").status, MatchStatus::Redirected);
    }

    #[tokio::test]
    async fn test_not_found_goes_to_nearest_handler() {
        let h = Harness::new(
            RouteDef::root().child(
                RouteDef::new("docs")
                    .not_found_handler()
                    .child(RouteDef::new("$page").child(RouteDef::new("edit").loader(|_| async {
                        Err(NotFound::new().into())
                    }))),
            ),
        );

        let outcome = h.load("/docs/intro/edit").await;
        let LoadOutcome::Settled(ids) = outcome else {
            panic!("expected settled chain");
        };
        assert_eq!(ids.last().map(String::as_str), Some("/docs"));
        assert_eq!(h.get("/docs").status, MatchStatus::NotFound);
    }

    #[tokio::test]
    async fn test_params_error_reported_before_guard() {
        let guard_ran = Arc::new(AtomicUsize::new(0));
        let counter = guard_ran.clone();
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("n/$id")
                .parse_params(|_| Err("not a number".to_string()))
                .before_load(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(None) }
                }),
        ));

        h.load("/n/x").await;
        assert_eq!(guard_ran.load(Ordering::SeqCst), 0);
        let m = h.get("/n/$idx");
        assert_eq!(m.status, MatchStatus::Error);
        assert!(matches!(m.error, Some(RouteError::ParamParse { .. })));
    }

    #[tokio::test]
    async fn test_fresh_data_is_not_refetched() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("a")
                .stale_time(Duration::from_secs(60))
                .loader(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Value::from(1)) }
                }),
        ));

        let req = h.request("/a");
        h.engine.load_matches(h.store.clone(), req.clone()).await;
        h.engine.load_matches(h.store.clone(), req).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_revalidation_is_restarted() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let h = Harness::new(RouteDef::root().child(RouteDef::new("a").loader(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(Value::from(n as u64))
            }
        })));

        let req = h.request("/a");
        h.engine.load_matches(h.store.clone(), req.clone()).await;
        assert_eq!(h.get("/a").loader_data, Some(Value::from(1u64)));

        h.engine.load_matches(h.store.clone(), req.clone()).await;
        h.get("/a").abort.abort();
        h.engine.load_matches(h.store.clone(), req).await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        let a = h.get("/a");
        assert!(!a.is_fetching);
        assert_eq!(a.loader_data, Some(Value::from(3u64)));
        assert_eq!(h.engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_guard_failure_ends_the_chain() {
        let h = Harness::new(RouteDef::root().child(
            RouteDef::new("a")
                .before_load(|_| async { Err(LoadError::failed("denied")) })
                .child(RouteDef::new("b").loader(|_| async { Ok(Value::Null) })),
        ));

        let LoadOutcome::Settled(ids) = h.load("/a/b").await else {
            panic!("expected settled chain");
        };
        assert_eq!(ids, vec!["__root__", "/a"]);
        assert_eq!(h.get("/a").status, MatchStatus::Error);
    }

    #[tokio::test]
    async fn test_superseded_load_reports_it() {
        let h = Harness::new(RouteDef::root().child(RouteDef::new("slow").before_load(|_| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(None)
        })));

        let req = h.request("/slow");
        let engine = h.engine.clone();
        let store: Arc<dyn MatchStore> = h.store.clone();
        let task = tokio::spawn(async move { engine.load_matches(store, req).await });
        h.store.generation.store(2, Ordering::SeqCst);
        assert!(matches!(task.await.unwrap(), LoadOutcome::Superseded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_loader_raises_pending_flag() {
        let tree = Arc::new(
            RouteTree::build(RouteDef::root().child(RouteDef::new("slow").loader(|_| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(Value::Null)
            })))
            .unwrap(),
        );
        let config = RouterConfig {
            default_pending_ms: Some(100),
            default_pending_min_ms: 500,
            ..Default::default()
        };
        let h = Harness {
            engine: Arc::new(LoadEngine::new(tree.clone(), config)),
            store: Arc::new(TestStore {
                matches: Mutex::new(Vec::new()),
                generation: AtomicU64::new(1),
            }),
            tree,
        };

        let req = h.request("/slow");
        let engine = h.engine.clone();
        let store: Arc<dyn MatchStore> = h.store.clone();
        let started = Instant::now();
        let task = tokio::spawn(async move { engine.load_matches(store, req).await });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(h.get("/slow").show_pending);

        task.await.unwrap();
        // shown at 100ms, held for at least 500ms
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert!(!h.get("/slow").show_pending);
    }
}
