//! Node registry records.
//!
//! A node is identified by its signed 32-bit node number (`num`). Everything
//! else on a record is replaced wholesale on each sighting; the only field with
//! write-time rules is the public key inside [`UserIdentity`], see
//! `nodedb_services::identity`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Length of a mesh public key (Curve25519).
pub const PUBLIC_KEY_LEN: usize = 32;

/// Sentinel written in place of a public key when a pinned identity is
/// contradicted by a later sighting.
///
/// The all-zero Curve25519 point has small order and is never the output of
/// key generation, so it cannot collide with a real key.
pub const ERROR_PUBLIC_KEY: [u8; PUBLIC_KEY_LEN] = [0u8; PUBLIC_KEY_LEN];

/// Returns the sentinel key as an owned byte buffer.
pub fn error_public_key() -> Bytes {
    Bytes::from_static(&ERROR_PUBLIC_KEY)
}

/// Reinterprets a node number as the unsigned value radios print.
pub fn unsigned_num(num: i32) -> u32 {
    num as u32
}

/// Renders a node number in the `!xxxxxxxx` user id form.
pub fn user_id_for(num: i32) -> String {
    format!("!{:08x}", unsigned_num(num))
}

// ── Identity ─────────────────────────────────────────────────────────────────

/// The user identity a node presents, including its public key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    /// User id string, normally `!xxxxxxxx`.
    pub id: String,
    pub long_name: String,
    pub short_name: String,
    pub hw_model: String,
    pub is_licensed: bool,

    /// Opaque public key bytes. Empty means no key was presented.
    #[serde(with = "hex_bytes")]
    pub public_key: Bytes,

    /// Set once a key has been confirmed for this node.
    pub has_pkc: bool,
}

impl UserIdentity {
    /// True when the stored key is the conflict sentinel.
    pub fn has_key_conflict(&self) -> bool {
        self.public_key.as_ref() == ERROR_PUBLIC_KEY
    }
}

// ── Node ─────────────────────────────────────────────────────────────────────

/// A peer radio node as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeRecord {
    /// Node number. Unique across the registry.
    pub num: i32,

    /// Absent names mark an "unknown" node.
    pub long_name: Option<String>,
    pub short_name: Option<String>,

    /// Unix seconds of the last packet heard from this node.
    pub last_heard: i64,

    /// `(0.0, 0.0)` is treated the same as no fix.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Relay hops from the local device. Negative means unknown.
    pub hops_away: i32,

    pub channel: i32,
    pub via_mqtt: bool,
    pub is_favorite: bool,
    pub is_ignored: bool,

    pub snr: f32,
    pub rssi: i32,

    pub user: UserIdentity,
}

impl Default for NodeRecord {
    fn default() -> Self {
        Self {
            num: 0,
            long_name: None,
            short_name: None,
            last_heard: 0,
            latitude: None,
            longitude: None,
            hops_away: -1,
            channel: 0,
            via_mqtt: false,
            is_favorite: false,
            is_ignored: false,
            snr: 0.0,
            rssi: 0,
            user: UserIdentity::default(),
        }
    }
}

impl NodeRecord {
    /// A bare record for `num` with unknown distance.
    pub fn new(num: i32) -> Self {
        Self {
            num,
            ..Default::default()
        }
    }

    /// `!xxxxxxxx` rendering of this node's number.
    pub fn user_id_hex(&self) -> String {
        user_id_for(self.num)
    }

    /// Position, if the node has a real fix.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if !(lat == 0.0 && lon == 0.0) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_valid_position(&self) -> bool {
        self.position().is_some()
    }

    /// Nodes without a short name have never sent their user info.
    pub fn is_unknown(&self) -> bool {
        self.short_name.is_none()
    }

    /// Hop count, or `None` when unknown.
    pub fn known_hops(&self) -> Option<u32> {
        u32::try_from(self.hops_away).ok()
    }
}

// ── Local device ─────────────────────────────────────────────────────────────

/// Identity of the local device. At most one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MyNodeInfo {
    pub my_node_num: i32,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub could_update: bool,
    pub should_update: bool,
    pub current_packet_id: i64,
    pub message_timeout_msec: i32,
    pub min_app_version: i32,
    pub max_channels: i32,
    pub has_wifi: bool,
    pub device_id: Option<String>,
}

impl MyNodeInfo {
    pub fn new(my_node_num: i32) -> Self {
        Self {
            my_node_num,
            ..Default::default()
        }
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Device metadata reported by a node. Lives independently of its NodeRecord.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    pub num: i32,
    pub firmware_version: String,
    pub hw_model: String,
    pub role: String,
    pub has_wifi: bool,
    pub has_bluetooth: bool,
    pub has_ethernet: bool,
    /// Unix seconds when the metadata was received.
    pub timestamp: i64,
}

/// A node joined with its metadata, if any has been received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeWithMetadata {
    pub node: NodeRecord,
    pub metadata: Option<MetadataRecord>,
}

// ── Serde helpers ────────────────────────────────────────────────────────────

/// Serializes `Bytes` as a lowercase hex string.
pub mod hex_bytes {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
