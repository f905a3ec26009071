//! Route path matching.
//!
//! # Responsibilities
//! - Compare a concrete pathname against one route template
//! - Capture params (`$name`), splats (`$`) and fuzzy remainders (`**`)
//!
//! # Design Decisions
//! - Static comparison is case-insensitive unless asked otherwise
//! - Base segments are URL-decoded before comparison and capture
//! - A trailing `/` on the template matches a missing base segment, which is
//!   how index routes match their parent's pathname
//! - Fuzzy mode lets a shorter template match a longer pathname and reports
//!   the unmatched rest under `**`; a bare `/` template never matches fuzzily
//! - A pathname segment that is itself a placeholder (`$teamId`) is left
//!   uncaptured rather than failing the match, so an uninterpolated template
//!   still matches itself

use crate::routing::path::{decode_uri, remove_basepath};
use crate::routing::segment::{join_paths, parse_pathname, Segment, SegmentKind};
use std::collections::BTreeMap;

/// Params captured from a pathname, before any route-level parsing.
pub type RawParams = BTreeMap<String, String>;

/// Key under which a wildcard capture is stored.
pub const SPLAT: &str = "_splat";
/// Legacy alias of [`SPLAT`].
pub const SPLAT_ALIAS: &str = "*";
/// Key under which a fuzzy match reports the unmatched remainder.
pub const FUZZY_REST: &str = "**";

/// What to match a pathname against.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchLocation<'a> {
    /// Route template. `None` matches any pathname.
    pub to: Option<&'a str>,
    pub case_sensitive: bool,
    pub fuzzy: bool,
}

/// Match `pathname` against `location.to`. Returns captured params on success.
pub fn match_pathname(basepath: &str, pathname: &str, location: &MatchLocation<'_>) -> Option<RawParams> {
    match match_by_path(basepath, pathname, location) {
        Some(params) => Some(params),
        None if location.to.is_none() => Some(RawParams::new()),
        None => None,
    }
}

/// Segment-wise comparison of a pathname with a route template.
pub fn match_by_path(basepath: &str, from: &str, location: &MatchLocation<'_>) -> Option<RawParams> {
    let from = remove_basepath(basepath, from, location.case_sensitive);
    let to = remove_basepath(basepath, location.to.unwrap_or("$"), location.case_sensitive);

    let mut base = parse_pathname(from);
    let mut route = parse_pathname(to);
    if !from.starts_with('/') {
        base.insert(0, Segment::slash());
    }
    if !to.starts_with('/') {
        route.insert(0, Segment::slash());
    }

    let mut params = RawParams::new();
    let matched = walk(&base, &route, location, &mut params);
    matched.then_some(params)
}

fn walk(base: &[Segment], route: &[Segment], location: &MatchLocation<'_>, params: &mut RawParams) -> bool {
    let len = base.len().max(route.len());

    for i in 0..len {
        let base_segment = base.get(i);
        let route_segment = route.get(i);
        let is_last_base = i + 1 >= base.len();
        let is_last_route = i + 1 >= route.len();

        if let Some(route_segment) = route_segment {
            match route_segment.kind {
                SegmentKind::Wildcard => {
                    let rest = join_paths(base[i.min(base.len())..].iter().map(|s| s.value.as_str()));
                    let splat = decode_uri(&rest);
                    params.insert(SPLAT_ALIAS.to_string(), splat.clone());
                    params.insert(SPLAT.to_string(), splat);
                    return true;
                }
                SegmentKind::Static => {
                    let base_empty = base_segment.map_or(true, |s| s.value.is_empty());
                    if route_segment.value == "/" && base_empty {
                        return true;
                    }
                    if let Some(base_segment) = base_segment {
                        let decoded = decode_uri(&base_segment.value);
                        let equal = if location.case_sensitive {
                            route_segment.value == decoded
                        } else {
                            route_segment.value.to_lowercase() == decoded.to_lowercase()
                        };
                        if !equal {
                            return false;
                        }
                    }
                }
                SegmentKind::Param => {}
            }

            let Some(base_segment) = base_segment else {
                return false;
            };

            if route_segment.kind == SegmentKind::Param {
                if base_segment.value == "/" {
                    return false;
                }
                if !base_segment.value.starts_with('$') {
                    params.insert(
                        route_segment.param_name().to_string(),
                        decode_uri(&base_segment.value),
                    );
                }
            }
        }

        if !is_last_base && is_last_route {
            let rest = join_paths(base[i + 1..].iter().map(|s| s.value.as_str()));
            params.insert(FUZZY_REST.to_string(), rest);
            return location.fuzzy && route_segment.map_or(true, |s| s.value != "/");
        }
    }

    true
}
