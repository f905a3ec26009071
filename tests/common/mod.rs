//! Shared utilities for router integration tests.

#![allow(dead_code)]

use route_engine::history::{Blocker, History, HistoryAction, HistoryListener, HistoryLocation, Subscription};
use route_engine::{MemoryHistory, RouteDef, RouteTree, Router, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Memory history that remembers every write.
pub struct RecordingHistory {
    inner: MemoryHistory,
    writes: Mutex<Vec<(HistoryAction, String)>>,
}

impl RecordingHistory {
    pub fn new(initial: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryHistory::new(initial),
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn writes(&self) -> Vec<(HistoryAction, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn href(&self) -> String {
        self.inner.location().href()
    }
}

impl History for RecordingHistory {
    fn location(&self) -> HistoryLocation {
        self.inner.location()
    }

    fn push(&self, href: &str, state: Value) -> bool {
        self.writes.lock().unwrap().push((HistoryAction::Push, href.to_string()));
        self.inner.push(href, state)
    }

    fn replace(&self, href: &str, state: Value) -> bool {
        self.writes.lock().unwrap().push((HistoryAction::Replace, href.to_string()));
        self.inner.replace(href, state)
    }

    fn go(&self, delta: isize) -> bool {
        self.inner.go(delta)
    }

    fn listen(&self, listener: HistoryListener) -> Subscription {
        self.inner.listen(listener)
    }

    fn block(&self, blocker: Blocker) -> Subscription {
        self.inner.block(blocker)
    }
}

/// Router over `root` with a recording history at `initial`.
pub fn router(root: RouteDef, initial: &str) -> (Router, Arc<RecordingHistory>) {
    let history = RecordingHistory::new(initial);
    let tree = RouteTree::build(root).unwrap();
    let router = Router::builder(tree).history(history.clone()).build().unwrap();
    (router, history)
}

/// Poll `check` until it holds or two seconds pass.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Ids of the committed matches.
pub fn committed_ids(router: &Router) -> Vec<String> {
    router.state().matches.iter().map(|m| m.id.clone()).collect()
}

/// Value of a loader-data field as a string.
pub fn data_str(router: &Router, id: &str) -> Option<String> {
    router
        .get_match(id)?
        .loader_data?
        .as_str()
        .map(str::to_string)
}
