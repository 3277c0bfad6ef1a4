//! Entity matching: pairing a local entry with the remote record it edits.
//!
//! Identity wins when the local entry carries one and the record still
//! exists; otherwise a content key derived from the normalized salient
//! fields is used. The key fallback can pair two distinct real-world
//! entities that happen to normalize identically (same certification name
//! and organization, say) — that ambiguity is inherent to the approach and
//! deliberately left in place.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::models::profile::{LocalEntry, RemoteRecord};
use crate::normalize::normalize_key;
use crate::reconcile::sections::{canonical_fields, Collection};

/// Separator between salient fields inside a content key. A non-printing
/// character so `("a", "bc")` and `("ab", "c")` never collide.
const KEY_SEPARATOR: char = '\x1f';

/// A local entry reduced to its comparable form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    pub id: Option<i64>,
    pub key: String,
    pub payload: Map<String, Value>,
}

/// A remote record reduced to its comparable form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRemote {
    pub id: i64,
    pub key: String,
    pub payload: Map<String, Value>,
}

/// Derives the content key from an already-canonicalized payload.
///
/// Returns the empty string when every salient field is blank; such an
/// entry is incomplete and must be excluded from matching and from every
/// planned operation.
pub fn content_key(collection: Collection, canonical: &Map<String, Value>) -> String {
    let parts: Vec<String> = collection
        .rules()
        .key_fields
        .iter()
        .map(|field| {
            canonical
                .get(*field)
                .and_then(|v| v.as_str())
                .map(normalize_key)
                .unwrap_or_default()
        })
        .collect();

    if parts.iter().all(|p| p.is_empty()) {
        return String::new();
    }
    parts.join(&KEY_SEPARATOR.to_string())
}

pub fn normalize_local(collection: Collection, entry: &LocalEntry) -> NormalizedEntry {
    let payload = canonical_fields(collection, &entry.fields);
    let key = content_key(collection, &payload);
    NormalizedEntry {
        id: entry.id,
        key,
        payload,
    }
}

pub fn normalize_remote(collection: Collection, record: &RemoteRecord) -> NormalizedRemote {
    let payload = canonical_fields(collection, &record.fields);
    let key = content_key(collection, &payload);
    NormalizedRemote {
        id: record.id,
        key,
        payload,
    }
}

/// Finds the remote record a local entry corresponds to.
///
/// Identity first: an `id` that still exists remotely settles the match.
/// Otherwise the first unclaimed remote record with an equal, non-empty
/// content key wins. `None` signals "create".
pub fn match_remote<'a>(
    entry: &NormalizedEntry,
    remotes: &'a [NormalizedRemote],
    claimed: &HashSet<i64>,
) -> Option<&'a NormalizedRemote> {
    if let Some(id) = entry.id {
        if let Some(remote) = remotes.iter().find(|r| r.id == id) {
            return Some(remote);
        }
        // Stale identity (deleted out from under us) — fall through to keys.
    }

    if entry.key.is_empty() {
        return None;
    }
    remotes
        .iter()
        .find(|r| !claimed.contains(&r.id) && r.key == entry.key)
}
