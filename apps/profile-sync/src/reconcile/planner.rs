//! Diff planning: the minimal create/update/delete set for one collection.
//!
//! The planner is generic over the section rules table; there is exactly one
//! planning routine for all seven collections. Its output is free of
//! observable no-ops: an update is only planned when the normalized payloads
//! actually differ, and running the planner twice against unchanged inputs
//! yields an empty plan the second time.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::models::profile::{LocalEntry, ProfileDocument, RemoteRecord, VerifiedProfile};
use crate::reconcile::matcher::{match_remote, normalize_local, normalize_remote};
use crate::reconcile::sections::Collection;

/// One planned action against a remote collection.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOp {
    Create(Value),
    Update(i64, Value),
    Delete(i64),
}

impl DiffOp {
    /// Execution rank within a collection: creates, then updates, then
    /// deletes.
    pub fn rank(&self) -> u8 {
        match self {
            DiffOp::Create(_) => 0,
            DiffOp::Update(..) => 1,
            DiffOp::Delete(_) => 2,
        }
    }
}

/// The operations planned for a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub collection: Collection,
    pub ops: Vec<DiffOp>,
}

impl SectionPlan {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Plans one collection.
///
/// With the section "none" flag set, every remote record is deleted and the
/// local list is ignored. Otherwise local entries are walked in list order;
/// the first entry to claim an identity or a content key wins and later
/// duplicates are dropped entirely. Remote records left unclaimed at the
/// end are deleted — their identities are absent from the local list.
pub fn plan_section(
    collection: Collection,
    local: &[LocalEntry],
    remote: &[RemoteRecord],
    none_flag: bool,
) -> SectionPlan {
    if none_flag {
        let ops = remote.iter().map(|r| DiffOp::Delete(r.id)).collect();
        return SectionPlan { collection, ops };
    }

    let remotes: Vec<_> = remote
        .iter()
        .map(|r| normalize_remote(collection, r))
        .collect();

    let mut claimed: HashSet<i64> = HashSet::new();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut creates = Vec::new();
    let mut updates = Vec::new();

    for entry in local {
        let entry = normalize_local(collection, entry);

        if entry.key.is_empty() {
            // Incomplete entry: no operation, but a persisted identity still
            // counts as present locally and must not be swept up as a delete.
            if let Some(id) = entry.id {
                claimed.insert(id);
            }
            continue;
        }

        if !seen_keys.insert(entry.key.clone()) {
            debug!(%collection, key = %entry.key, "dropping duplicate entry");
            continue;
        }
        if let Some(id) = entry.id {
            if claimed.contains(&id) {
                continue;
            }
        }

        match match_remote(&entry, &remotes, &claimed) {
            Some(remote) => {
                claimed.insert(remote.id);
                if remote.payload != entry.payload {
                    updates.push(DiffOp::Update(remote.id, Value::Object(entry.payload)));
                }
            }
            None => creates.push(DiffOp::Create(Value::Object(entry.payload))),
        }
    }

    let mut ops = creates;
    ops.append(&mut updates);
    ops.extend(
        remotes
            .iter()
            .filter(|r| !claimed.contains(&r.id))
            .map(|r| DiffOp::Delete(r.id)),
    );

    SectionPlan { collection, ops }
}

/// Plans every collection of a document against the verified remote state,
/// keeping only non-empty plans.
pub fn plan_document(doc: &ProfileDocument, verified: &VerifiedProfile) -> Vec<SectionPlan> {
    Collection::ALL
        .iter()
        .map(|&collection| {
            plan_section(
                collection,
                doc.entries(collection),
                verified.records(collection),
                doc.none_flag(collection),
            )
        })
        .filter(|plan| !plan.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn entry(id: Option<i64>, fields: Value) -> LocalEntry {
        LocalEntry {
            id,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    fn record(id: i64, fields: Value) -> RemoteRecord {
        RemoteRecord {
            id,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    /// Applies a plan to a remote list the way a well-behaved backend would,
    /// so idempotence can be checked end to end.
    fn apply(remote: &mut Vec<RemoteRecord>, plan: &SectionPlan, next_id: &mut i64) {
        for op in &plan.ops {
            match op {
                DiffOp::Create(payload) => {
                    remote.push(RemoteRecord {
                        id: *next_id,
                        fields: payload.as_object().cloned().unwrap_or_default(),
                    });
                    *next_id += 1;
                }
                DiffOp::Update(id, payload) => {
                    if let Some(r) = remote.iter_mut().find(|r| r.id == *id) {
                        r.fields = payload.as_object().cloned().unwrap_or_default();
                    }
                }
                DiffOp::Delete(id) => remote.retain(|r| r.id != *id),
            }
        }
    }

    #[test]
    fn test_create_when_no_match() {
        let local = vec![entry(None, json!({"name": "Rust"}))];
        let plan = plan_section(Collection::Skills, &local, &[], false);
        assert_eq!(plan.ops.len(), 1);
        assert!(matches!(plan.ops[0], DiffOp::Create(_)));
    }

    #[test]
    fn test_noop_update_suppressed_across_formatting() {
        // "2024-01" and "2024-01-01" normalize identically, so no update.
        let local = vec![entry(
            None,
            json!({"title": "Portfolio", "start_date": "2024-01"}),
        )];
        let remote = vec![record(
            4,
            json!({"project_name": "Portfolio", "start_date": "2024-01-01"}),
        )];
        let plan = plan_section(Collection::Projects, &local, &remote, false);
        assert!(plan.ops.is_empty());
    }

    #[test]
    fn test_update_when_payload_differs() {
        let local = vec![entry(Some(4), json!({"name": "Rust", "level": "Expert"}))];
        let remote = vec![record(4, json!({"name": "Rust", "level": "Beginner"}))];
        let plan = plan_section(Collection::Skills, &local, &remote, false);
        assert_eq!(plan.ops.len(), 1);
        match &plan.ops[0] {
            DiffOp::Update(id, payload) => {
                assert_eq!(*id, 4);
                assert_eq!(payload["level"], json!("Expert"));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_unclaimed_remote_deleted() {
        let local = vec![entry(None, json!({"name": "Rust"}))];
        let remote = vec![
            record(1, json!({"name": "Rust"})),
            record(2, json!({"name": "COBOL"})),
        ];
        let plan = plan_section(Collection::Skills, &local, &remote, false);
        assert_eq!(plan.ops, vec![DiffOp::Delete(2)]);
    }

    #[test]
    fn test_none_flag_deletes_everything() {
        let local = vec![entry(None, json!({"name": "AWS SAA", "issuer": "AWS"}))];
        let remote = vec![
            record(10, json!({"name": "AWS SAA", "organization": "AWS"})),
            record(11, json!({"name": "CKA", "organization": "CNCF"})),
        ];
        let plan = plan_section(Collection::Certifications, &local, &remote, true);
        assert_eq!(plan.ops, vec![DiffOp::Delete(10), DiffOp::Delete(11)]);
    }

    #[test]
    fn test_duplicate_content_key_first_wins() {
        // Both reduce to key "python"; remote already matches the first, so
        // the whole plan is empty — the duplicate is neither created nor
        // updated.
        let local = vec![
            entry(None, json!({"name": "Python"})),
            entry(None, json!({"name": "python "})),
        ];
        let remote = vec![record(7, json!({"name": "Python"}))];
        let plan = plan_section(Collection::Skills, &local, &remote, false);
        assert!(plan.ops.is_empty());
    }

    #[test]
    fn test_duplicate_key_differing_payload_single_update() {
        let local = vec![
            entry(None, json!({"name": "python", "level": "Expert"})),
            entry(None, json!({"name": "Python "})),
        ];
        let remote = vec![record(7, json!({"name": "Python"}))];
        let plan = plan_section(Collection::Skills, &local, &remote, false);
        assert_eq!(plan.ops.len(), 1);
        assert!(matches!(plan.ops[0], DiffOp::Update(7, _)));
    }

    #[test]
    fn test_blank_entry_excluded_but_identity_retained() {
        // A persisted entry whose salient fields went blank produces no
        // operation, and its remote record is not deleted either.
        let local = vec![entry(Some(3), json!({"name": "  "}))];
        let remote = vec![record(3, json!({"name": "Rust"}))];
        let plan = plan_section(Collection::Skills, &local, &remote, false);
        assert!(plan.ops.is_empty());
    }

    #[test]
    fn test_blank_unpersisted_entry_is_ignored() {
        let local = vec![entry(None, Value::Object(Map::new()))];
        let plan = plan_section(Collection::Skills, &local, &[], false);
        assert!(plan.ops.is_empty());
    }

    #[test]
    fn test_ops_ordered_create_update_delete() {
        let local = vec![
            entry(None, json!({"name": "New"})),
            entry(Some(1), json!({"name": "Rust", "level": "Expert"})),
        ];
        let remote = vec![
            record(1, json!({"name": "Rust"})),
            record(2, json!({"name": "Gone"})),
        ];
        let plan = plan_section(Collection::Skills, &local, &remote, false);
        let ranks: Vec<u8> = plan.ops.iter().map(DiffOp::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_planning_is_idempotent_after_apply() {
        let local = vec![
            entry(None, json!({"name": "Rust", "level": "Expert"})),
            entry(None, json!({"name": "Go"})),
        ];
        let mut remote = vec![
            record(1, json!({"name": "Rust", "level": "Beginner"})),
            record(2, json!({"name": "COBOL"})),
        ];
        let mut next_id = 100;

        let first = plan_section(Collection::Skills, &local, &remote, false);
        assert!(!first.ops.is_empty());
        apply(&mut remote, &first, &mut next_id);

        let second = plan_section(Collection::Skills, &local, &remote, false);
        assert!(second.ops.is_empty(), "second pass must be a no-op: {second:?}");
    }

    #[test]
    fn test_plan_document_skips_empty_sections() {
        let mut doc = ProfileDocument::default();
        doc.skills.push(entry(None, json!({"name": "Rust"})));
        let verified = VerifiedProfile::default();
        let plans = plan_document(&doc, &verified);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].collection, Collection::Skills);
    }
}
