//! Node listing: filter predicates and ordering over a store snapshot.
//!
//! Ordering is, in priority:
//!   1. the self-node, unconditionally first
//!   2. the per-sort key, ascending
//!   3. `last_heard`, descending
//!   4. `num`, ascending (snapshot order is arbitrary, so ties need a key)

use std::cmp::Ordering;

use nodedb_core::node::{unsigned_num, NodeRecord};
use nodedb_core::query::{NodeQuery, NodeSort, FILTER_DISABLED, HOPS_FILTER_DISABLED};

/// Distance key for nodes without a usable fix, and hop key for nodes with
/// unknown hops. Sorts after every real value.
pub const SORT_LAST: i64 = 999_999_999;

/// Value a node is ordered by for a given [`NodeSort`].
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// No value. Sorts before everything else.
    Missing,
    Int(i64),
    Real(f64),
    Text(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Int(_) | Self::Real(_) => 1,
            Self::Text(_) => 2,
        }
    }

    /// Total order: missing < numbers < text. Ints and reals compare by value.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Real(a), Self::Real(b)) => a.total_cmp(b),
            (Self::Int(a), Self::Real(b)) => (*a as f64).total_cmp(b),
            (Self::Real(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

// ── Filtering ────────────────────────────────────────────────────────────────

/// Excludes nodes without a short name unless `include_unknown` is set.
pub fn passes_unknown(node: &NodeRecord, include_unknown: bool) -> bool {
    include_unknown || !node.is_unknown()
}

/// Case-insensitive substring match on names and both renderings of `num`.
pub fn matches_text(node: &NodeRecord, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    let contains = |hay: &str| hay.to_lowercase().contains(&needle);

    node.long_name.as_deref().is_some_and(contains)
        || node.short_name.as_deref().is_some_and(contains)
        || contains(node.user_id_hex().as_str())
        || contains(unsigned_num(node.num).to_string().as_str())
}

/// `-1` disables the floor.
pub fn passes_last_heard(node: &NodeRecord, last_heard_min: i64) -> bool {
    last_heard_min == FILTER_DISABLED || node.last_heard >= last_heard_min
}

/// `-1` disables the cap. Unknown hops never pass an active cap; the
/// self-node always does.
pub fn passes_hops(node: &NodeRecord, hops_away_max: i32, self_num: Option<i32>) -> bool {
    hops_away_max == HOPS_FILTER_DISABLED
        || (node.hops_away >= 0 && node.hops_away <= hops_away_max)
        || Some(node.num) == self_num
}

/// All filters of `query`, ANDed.
pub fn matches(node: &NodeRecord, query: &NodeQuery, self_num: Option<i32>) -> bool {
    passes_unknown(node, query.include_unknown)
        && matches_text(node, &query.filter)
        && passes_last_heard(node, query.last_heard_min)
        && passes_hops(node, query.hops_away_max, self_num)
}

// ── Ordering ─────────────────────────────────────────────────────────────────

/// Squared distance in degrees from `origin`.
///
/// Without an origin every fixed node is `Missing`, so fixed nodes still sort
/// ahead of unfixed ones and fall through to the recency tie-break.
fn distance_key(node: &NodeRecord, origin: Option<(f64, f64)>) -> SortKey {
    let Some((lat, lon)) = node.position() else {
        return SortKey::Int(SORT_LAST);
    };
    match origin {
        Some((olat, olon)) => {
            let dlat = lat - olat;
            let dlon = lon - olon;
            SortKey::Real(dlat * dlat + dlon * dlon)
        }
        None => SortKey::Missing,
    }
}

/// Key `node` is ordered by under `sort`. `origin` is the self-node's fix.
pub fn sort_key(node: &NodeRecord, sort: &NodeSort, origin: Option<(f64, f64)>) -> SortKey {
    match sort {
        NodeSort::LastHeard => SortKey::Int(node.last_heard.saturating_neg()),
        NodeSort::Alpha => node
            .long_name
            .as_ref()
            .map(|name| SortKey::Text(name.to_uppercase()))
            .unwrap_or(SortKey::Missing),
        NodeSort::Distance => distance_key(node, origin),
        NodeSort::HopsAway => match node.known_hops() {
            Some(hops) => SortKey::Int(i64::from(hops)),
            None => SortKey::Int(SORT_LAST),
        },
        NodeSort::Channel => SortKey::Int(i64::from(node.channel)),
        NodeSort::ViaMqtt => SortKey::Int(i64::from(node.via_mqtt)),
        NodeSort::ViaFavorite => SortKey::Int(-i64::from(node.is_favorite)),
        NodeSort::Unrecognized(_) => SortKey::Int(0),
    }
}

/// Self-node first, then by key, then most recently heard, then by `num`.
pub fn compare(
    a: (&NodeRecord, &SortKey),
    b: (&NodeRecord, &SortKey),
    self_num: Option<i32>,
) -> Ordering {
    let (node_a, key_a) = a;
    let (node_b, key_b) = b;
    let is_self = |n: &NodeRecord| Some(n.num) == self_num;

    is_self(node_b)
        .cmp(&is_self(node_a))
        .then_with(|| key_a.total_cmp(key_b))
        .then_with(|| node_b.last_heard.cmp(&node_a.last_heard))
        .then_with(|| node_a.num.cmp(&node_b.num))
}

/// Filter and order a snapshot.
///
/// `self_num` is the local device's node number, if known. The distance
/// origin is taken from the self-node in the unfiltered snapshot.
pub fn list(nodes: Vec<NodeRecord>, query: &NodeQuery, self_num: Option<i32>) -> Vec<NodeRecord> {
    let origin = self_num.and_then(|num| {
        nodes
            .iter()
            .find(|n| n.num == num)
            .and_then(NodeRecord::position)
    });

    let mut keyed: Vec<(SortKey, NodeRecord)> = nodes
        .into_iter()
        .filter(|n| matches(n, query, self_num))
        .map(|n| (sort_key(&n, &query.sort, origin), n))
        .collect();

    keyed.sort_by(|(ka, a), (kb, b)| compare((a, ka), (b, kb), self_num));
    keyed.into_iter().map(|(_, n)| n).collect()
}

/// Every node, self-node first then most recently heard. No filtering.
pub fn by_num(nodes: Vec<NodeRecord>, self_num: Option<i32>) -> Vec<NodeRecord> {
    list(nodes, &NodeQuery::default(), self_num)
}
