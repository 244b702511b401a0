//! Trust-on-first-use pinning of node public keys.
//!
//! The first key a node presents is accepted. Once a node has a confirmed key
//! (`has_pkc`), a later sighting carrying a different key keeps its new names
//! but has its key replaced by [`ERROR_PUBLIC_KEY`], so consumers can surface
//! the conflict. A mismatch is recorded, never raised.

use nodedb_core::node::{error_public_key, UserIdentity};

/// Decide which identity to store for a node.
///
/// `existing` is the identity currently stored for the node, if any.
///
/// On a mismatch a warning is logged carrying the *incoming* long and short
/// names, not the names stored with the trusted key.
pub fn resolve(existing: Option<&UserIdentity>, incoming: UserIdentity) -> UserIdentity {
    let Some(existing) = existing else {
        return incoming;
    };

    if !existing.has_pkc || existing.public_key == incoming.public_key {
        return incoming;
    }

    // Names come from the incoming identity.
    tracing::warn!(
        id = %incoming.id,
        stored_key = %hex::encode(&existing.public_key),
        presented_key = %hex::encode(&incoming.public_key),
        "public key mismatch from {} ({})",
        incoming.long_name,
        incoming.short_name,
    );

    UserIdentity {
        public_key: error_public_key(),
        ..incoming
    }
}
