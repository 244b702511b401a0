//! Listing query parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of `last_heard_min` that turns the recency floor off.
pub const FILTER_DISABLED: i64 = -1;

/// Value of `hops_away_max` that turns the hop cap off.
pub const HOPS_FILTER_DISABLED: i32 = -1;

/// Secondary ordering applied after the self-node.
///
/// Parsing never fails: an unknown name becomes [`NodeSort::Unrecognized`],
/// which leaves nodes ordered only by recency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeSort {
    #[default]
    LastHeard,
    Alpha,
    Distance,
    HopsAway,
    Channel,
    ViaMqtt,
    ViaFavorite,
    Unrecognized(String),
}

impl NodeSort {
    pub fn as_str(&self) -> &str {
        match self {
            Self::LastHeard => "last_heard",
            Self::Alpha => "alpha",
            Self::Distance => "distance",
            Self::HopsAway => "hops_away",
            Self::Channel => "channel",
            Self::ViaMqtt => "via_mqtt",
            Self::ViaFavorite => "via_favorite",
            Self::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<&str> for NodeSort {
    fn from(value: &str) -> Self {
        match value {
            "last_heard" => Self::LastHeard,
            "alpha" => Self::Alpha,
            "distance" => Self::Distance,
            "hops_away" => Self::HopsAway,
            "channel" => Self::Channel,
            "via_mqtt" => Self::ViaMqtt,
            "via_favorite" => Self::ViaFavorite,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for NodeSort {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<NodeSort> for String {
    fn from(value: NodeSort) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a node listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeQuery {
    pub sort: NodeSort,
    /// Case-insensitive substring over names and node id. Empty matches all.
    pub filter: String,
    /// Include nodes that have no short name yet.
    pub include_unknown: bool,
    /// `-1` disables the hop cap.
    pub hops_away_max: i32,
    /// Unix seconds. `-1` disables the recency floor.
    pub last_heard_min: i64,
}

impl Default for NodeQuery {
    fn default() -> Self {
        Self {
            sort: NodeSort::LastHeard,
            filter: String::new(),
            include_unknown: true,
            hops_away_max: HOPS_FILTER_DISABLED,
            last_heard_min: FILTER_DISABLED,
        }
    }
}

impl NodeQuery {
    pub fn sorted_by(sort: impl Into<NodeSort>) -> Self {
        Self {
            sort: sort.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn include_unknown(mut self, include: bool) -> Self {
        self.include_unknown = include;
        self
    }

    pub fn hops_away_max(mut self, max: i32) -> Self {
        self.hops_away_max = max;
        self
    }

    pub fn last_heard_min(mut self, min: i64) -> Self {
        self.last_heard_min = min;
        self
    }
}
