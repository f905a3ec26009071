//! History collaborator.
//!
//! # Data Flow
//! ```text
//! router.commit_location(href, state)
//!     → History::push / History::replace
//!     → blockers consulted (may veto)
//!     → entry stack updated
//!     → listeners notified synchronously
//!     → router starts a load for the new location
//! ```
//!
//! # Design Decisions
//! - The router owns no URL state of its own; history is the source of truth
//! - Listeners run after internal locks are released, so they may read back
//! - Subscriptions are RAII handles

pub mod memory;

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

pub use memory::MemoryHistory;

/// A raw location as stored by a history implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLocation {
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
    /// Fragment including the leading `#`, or empty.
    pub hash: String,
    pub state: Value,
}

impl HistoryLocation {
    /// Split an href (`/path?query#hash`) into its parts.
    pub fn from_href(href: &str, state: Value) -> Self {
        let (rest, hash) = match href.find('#') {
            Some(i) => (&href[..i], href[i..].to_string()),
            None => (href, String::new()),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => (&rest[..i], rest[i..].to_string()),
            None => (rest, String::new()),
        };
        let pathname = if pathname.is_empty() { "/" } else { pathname };

        Self {
            pathname: pathname.to_string(),
            search: if search == "?" { String::new() } else { search },
            hash: if hash == "#" { String::new() } else { hash },
            state: if state.is_object() { state } else { Value::object() },
        }
    }

    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Why a history entry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Push,
    Replace,
    Pop,
}

pub type HistoryListener = Arc<dyn Fn(&HistoryLocation, HistoryAction) + Send + Sync>;

/// Returns `true` to veto a transition from the first location to the second.
pub type Blocker = Arc<dyn Fn(&HistoryLocation, &HistoryLocation) -> bool + Send + Sync>;

/// Source of truth for the current URL.
pub trait History: Send + Sync {
    fn location(&self) -> HistoryLocation;

    /// Add an entry. Returns `false` if a blocker vetoed it.
    fn push(&self, href: &str, state: Value) -> bool;

    /// Overwrite the current entry. Returns `false` if a blocker vetoed it.
    fn replace(&self, href: &str, state: Value) -> bool;

    /// Move within the entry stack. Returns `false` when out of range or vetoed.
    fn go(&self, delta: isize) -> bool;

    fn back(&self) -> bool {
        self.go(-1)
    }

    fn forward(&self) -> bool {
        self.go(1)
    }

    fn listen(&self, listener: HistoryListener) -> Subscription;

    fn block(&self, blocker: Blocker) -> Subscription;
}

/// Handle that removes a listener when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener for the lifetime of its source.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
