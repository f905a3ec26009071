//! Route scoring and ranking.
//!
//! # Responsibilities
//! - Score each segment of a route's full path
//! - Produce a total order in which more specific routes come first
//!
//! # Design Decisions
//! - Weights: index slash > static > param > wildcard
//! - Score vectors compare lexicographically; on a shared prefix the longer
//!   vector wins, so a param in position N never outranks a static there
//! - The bare `/` index route leads; it can only ever match the root pathname
//! - Remaining ties break on segment text, then on declaration order

use crate::routing::segment::{parse_pathname, trim_path_right, Segment, SegmentKind};
use std::cmp::Ordering;

const INDEX_WEIGHT: u8 = 4;
const STATIC_WEIGHT: u8 = 3;
const PARAM_WEIGHT: u8 = 2;
const WILDCARD_WEIGHT: u8 = 1;

/// A route prepared for ranking.
#[derive(Debug, Clone)]
pub struct RankEntry<K> {
    pub key: K,
    pub full_path: String,
    pub segments: Vec<Segment>,
    pub scores: Vec<u8>,
    pub is_index: bool,
    pub order: usize,
}

impl<K> RankEntry<K> {
    pub fn new(key: K, full_path: &str, order: usize) -> Self {
        let mut segments = parse_pathname(full_path);
        while segments.len() > 1 && segments.first().is_some_and(Segment::is_slash) {
            segments.remove(0);
        }
        let scores = segments.iter().map(segment_weight).collect();
        Self {
            key,
            full_path: full_path.to_string(),
            segments,
            scores,
            is_index: trim_path_right(full_path) == "/",
            order,
        }
    }
}

fn segment_weight(segment: &Segment) -> u8 {
    match segment.kind {
        SegmentKind::Static if segment.value == "/" => INDEX_WEIGHT,
        SegmentKind::Static => STATIC_WEIGHT,
        SegmentKind::Param => PARAM_WEIGHT,
        SegmentKind::Wildcard => WILDCARD_WEIGHT,
    }
}

/// Total order over ranked entries: `Less` means "tried first".
pub fn compare<K>(a: &RankEntry<K>, b: &RankEntry<K>) -> Ordering {
    b.is_index
        .cmp(&a.is_index)
        .then_with(|| compare_scores(&a.scores, &b.scores))
        .then_with(|| {
            a.segments
                .iter()
                .map(|s| s.value.as_str())
                .cmp(b.segments.iter().map(|s| s.value.as_str()))
        })
        .then_with(|| a.order.cmp(&b.order))
}

fn compare_scores(a: &[u8], b: &[u8]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match y.cmp(x) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    b.len().cmp(&a.len())
}

/// Sort entries into match order.
pub fn rank_routes<K>(mut entries: Vec<RankEntry<K>>) -> Vec<RankEntry<K>> {
    entries.sort_by(compare);
    entries
}
