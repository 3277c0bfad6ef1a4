//! Section-scoped document merging.
//!
//! Applies a sparse patch (recovered resume data, typically) onto a
//! ProfileDocument without disturbing anything the patch does not mention.
//! Pure: the input document is never mutated, so the merge composes safely
//! with whatever state container holds the document.

use serde_json::Value;

use crate::models::profile::{LocalEntry, ProfileDocument};
use crate::reconcile::sections::Collection;

/// Merges `patch` into `doc` and returns the merged document.
///
/// Recognized object sections (`basic_info`, `preferences`) merge key-wise,
/// with patch keys overriding and explicit nulls skipped. Recognized list
/// sections are replaced wholesale — parsed-resume recovery is a bulk fill,
/// and the patch carries no per-entry identity to merge element-wise.
/// Unknown keys and malformed section values are ignored, not propagated.
pub fn merge_document(doc: &ProfileDocument, patch: &Value) -> ProfileDocument {
    let mut out = doc.clone();
    let Some(patch) = patch.as_object() else {
        return out;
    };

    for (key, value) in patch {
        match key.as_str() {
            "basic_info" => out.basic_info = merge_object(&doc.basic_info, value),
            "preferences" => out.preferences = merge_object(&doc.preferences, value),
            _ => {
                if let Some(collection) = collection_for_key(key) {
                    if let Some(entries) = parse_entries(value) {
                        *out.entries_mut(collection) = entries;
                    }
                }
            }
        }
    }
    out
}

fn collection_for_key(key: &str) -> Option<Collection> {
    Collection::ALL.into_iter().find(|c| c.doc_key() == key)
}

fn parse_entries(value: &Value) -> Option<Vec<LocalEntry>> {
    serde_json::from_value(value.clone()).ok()
}

fn merge_object(base: &Value, patch: &Value) -> Value {
    let Some(patch) = patch.as_object() else {
        return base.clone();
    };
    let mut merged = base.as_object().cloned().unwrap_or_default();
    for (k, v) in patch {
        if v.is_null() {
            continue;
        }
        merged.insert(k.clone(), v.clone());
    }
    Value::Object(merged)
}
