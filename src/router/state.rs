//! Router state snapshots.

use crate::location::ParsedLocation;
use crate::matches::RouteMatch;
use crate::value::Value;
use serde::Serialize;

/// Whether a navigation is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouterStatus {
    #[default]
    Idle,
    Pending,
}

/// One immutable snapshot of everything the router knows.
///
/// Snapshots are never mutated once published; every change produces a new
/// `RouterState` that replaces the old one whole.
#[derive(Debug, Clone)]
pub struct RouterState {
    pub status: RouterStatus,
    pub is_loading: bool,
    /// Location currently being resolved (or last resolved).
    pub location: ParsedLocation,
    /// Location whose matches are committed in `matches`.
    pub resolved_location: Option<ParsedLocation>,
    pub matches: Vec<RouteMatch>,
    pub pending_matches: Option<Vec<RouteMatch>>,
    pub cached_matches: Vec<RouteMatch>,
    /// 200, 404 when any committed match is not-found, or the redirect status.
    pub status_code: u16,
}

impl Default for RouterState {
    fn default() -> Self {
        Self::new(ParsedLocation::new(
            "/",
            Value::object(),
            String::new(),
            "",
            Value::object(),
        ))
    }
}

impl RouterState {
    pub fn new(location: ParsedLocation) -> Self {
        Self {
            status: RouterStatus::Idle,
            is_loading: false,
            location,
            resolved_location: None,
            matches: Vec::new(),
            pending_matches: None,
            cached_matches: Vec::new(),
            status_code: 200,
        }
    }

    /// Look a match up by id in pending, then active, then cached matches.
    pub fn find_match(&self, id: &str) -> Option<&RouteMatch> {
        self.pending_matches
            .iter()
            .flatten()
            .chain(self.matches.iter())
            .chain(self.cached_matches.iter())
            .find(|m| m.id == id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.matches.iter().any(|m| m.id == id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending_matches.iter().flatten().any(|m| m.id == id)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        !self.is_active(id) && !self.is_pending(id) && self.cached_matches.iter().any(|m| m.id == id)
    }

    /// Copy of this state with the cached match `id` rewritten by `f`.
    /// Returns `None` when the id is not parked in the cache alone.
    pub fn with_cached_match(&self, id: &str, f: &dyn Fn(&mut RouteMatch)) -> Option<RouterState> {
        if !self.is_cached(id) {
            return None;
        }
        let mut next = self.clone();
        let slot = next.cached_matches.iter_mut().find(|m| m.id == id)?;
        f(slot);
        Some(next)
    }

    /// Copy of this state with the match `id` rewritten by `f`.
    ///
    /// The first bucket holding the id wins, in [`find_match`](Self::find_match)
    /// order. Returns `None` when no bucket holds it.
    pub fn with_match(&self, id: &str, f: &dyn Fn(&mut RouteMatch)) -> Option<RouterState> {
        let mut next = self.clone();
        let slot = next
            .pending_matches
            .iter_mut()
            .flatten()
            .chain(next.matches.iter_mut())
            .chain(next.cached_matches.iter_mut())
            .find(|m| m.id == id)?;
        f(slot);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::MatchStatus;
    use crate::routing::tree::RouteId;

    fn route_match(id: &str) -> RouteMatch {
        RouteMatch::new(id.to_string(), id.to_string(), RouteId(0), 0)
    }

    #[test]
    fn test_pending_bucket_wins() {
        let mut state = RouterState::default();
        state.matches = vec![route_match("/a")];
        state.pending_matches = Some(vec![route_match("/a")]);

        let next = state
            .with_match("/a", &|m| m.status = MatchStatus::Success)
            .unwrap();
        assert_eq!(next.pending_matches.as_ref().unwrap()[0].status, MatchStatus::Success);
        assert_eq!(next.matches[0].status, MatchStatus::Pending);
        // the original snapshot is untouched
        assert_eq!(state.pending_matches.as_ref().unwrap()[0].status, MatchStatus::Pending);
    }

    #[test]
    fn test_cached_rewrite_skips_claimed_matches() {
        let mut state = RouterState::default();
        state.cached_matches = vec![route_match("/a"), route_match("/b")];
        state.pending_matches = Some(vec![route_match("/a")]);

        assert!(state.with_cached_match("/a", &|m| m.preload = true).is_none());
        let next = state.with_cached_match("/b", &|m| m.preload = true).unwrap();
        assert!(next.cached_matches[1].preload);
        assert!(!next.cached_matches[0].preload);
    }

    #[test]
    fn test_unknown_id() {
        let state = RouterState::default();
        assert!(state.find_match("/nope").is_none());
        assert!(state.with_match("/nope", &|_| {}).is_none());
    }
}
