//! Pre-flight validation: required-field checks that run before any sync
//! attempt. A failing report blocks the whole save and never contacts the
//! network.
//!
//! Entirely blank entries are not errors — they are incomplete rows the
//! planner ignores. A partially filled entry that is missing one of its
//! salient fields is an error, because syncing it would either create a
//! junk record or match the wrong one.

use serde::Serialize;

use crate::models::profile::ProfileDocument;
use crate::reconcile::sections::{canonical_fields, Collection};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub section: String,
    /// Index within the section's entry list; 0 for singleton sections.
    pub index: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Pretty JSON of the per-field issues, for surfacing to the user.
    pub fn issues_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.issues).unwrap_or_default()
    }
}

/// Required fields of the basic-info singleton, checked only when the
/// section is present as an object.
const BASIC_INFO_REQUIRED: &[&str] = &["full_name", "email"];

pub fn validate_document(doc: &ProfileDocument) -> ValidationReport {
    let mut issues = Vec::new();

    if let Some(info) = doc.basic_info.as_object() {
        for &field in BASIC_INFO_REQUIRED {
            let blank = info
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.trim().is_empty())
                .unwrap_or(true);
            if blank {
                issues.push(ValidationIssue {
                    section: "basic_info".to_string(),
                    index: 0,
                    field: field.to_string(),
                    message: format!("{field} is required"),
                });
            }
        }
    }

    for collection in Collection::ALL {
        if doc.none_flag(collection) {
            continue;
        }
        for (index, entry) in doc.entries(collection).iter().enumerate() {
            let canonical = canonical_fields(collection, &entry.fields);
            if canonical.is_empty() && entry.id.is_none() {
                // Untouched blank row; the planner skips it.
                continue;
            }
            for &field in collection.rules().key_fields {
                if !canonical.contains_key(field) {
                    issues.push(ValidationIssue {
                        section: collection.doc_key().to_string(),
                        index,
                        field: field.to_string(),
                        message: format!("{field} is required"),
                    });
                }
            }
        }
    }

    ValidationReport {
        passed: issues.is_empty(),
        issues,
    }
}
