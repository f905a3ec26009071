//! Load engine.
//!
//! # Data Flow
//! ```text
//! LoadRequest (matches root-first, location, generation)
//!     → guard phase: serial, parent context threaded down, fresh abort per match
//!     → fetch phase: concurrent up to the first failed guard
//!         → in-flight dedupe by match id
//!         → fresh / stale-while-revalidate / blocking load
//!         → pending flag after pending_ms, held for pending_min_ms
//!     → outcome: settled chain, redirect, or superseded
//! ```
//!
//! # Design Decisions
//! - The engine never owns router state; it reads and writes matches through
//!   a [`MatchStore`] so every write is a whole-state replacement
//! - Every continuation re-checks the navigation generation before it
//!   touches anything a newer navigation owns
//! - Redirect and not-found are values, not panics or unwinding
//! - Preloads only write matches that are still in the cache bucket; once a
//!   navigation claims a match it shares the preload's work through the
//!   in-flight map alone

pub mod cache;
pub mod engine;
pub mod signal;

use crate::matches::RouteMatch;

pub use engine::{LoadEngine, LoadOutcome, LoadRequest};
pub use signal::{AbortController, AbortSignal};

/// Where the engine reads and writes matches.
pub trait MatchStore: Send + Sync {
    /// Current copy of a match from any bucket.
    fn get_match(&self, id: &str) -> Option<RouteMatch>;

    /// Rewrite a match in place of the bucket that holds it. No-op for unknown ids.
    fn update_match(&self, id: &str, f: &dyn Fn(&mut RouteMatch));

    /// Whether `generation` is still the newest navigation.
    fn is_latest(&self, generation: u64) -> bool;

    /// Whether the match sits in the cache bucket, outside any navigation.
    fn is_cached(&self, id: &str) -> bool {
        self.get_match(id).is_some()
    }

    /// Rewrite a match only while it sits in the cache bucket. Returns whether
    /// it was written.
    fn update_cached(&self, id: &str, f: &dyn Fn(&mut RouteMatch)) -> bool {
        if !self.is_cached(id) {
            return false;
        }
        self.update_match(id, f);
        true
    }
}
