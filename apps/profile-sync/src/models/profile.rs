//! Local and remote profile shapes.
//!
//! The `ProfileDocument` is the denormalized document a single editing
//! session owns; the backend stores each section as an independent
//! collection of identity-bearing records (`RemoteRecord`). The two use
//! different field spellings in places — alias resolution happens during
//! normalization, not here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::reconcile::sections::Collection;

/// One entry of a list section as held locally. `id` is present only once
/// the entry has been persisted remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LocalEntry {
    pub fn persisted(id: i64, fields: Map<String, Value>) -> Self {
        Self {
            id: Some(id),
            fields,
        }
    }
}

/// A server-stored entity for one collection. Identity is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The locally held, denormalized profile document.
///
/// Singleton sections (`basic_info`, `preferences`) are JSON objects; list
/// sections are ordered entry lists. The boolean "none" flags record that
/// the user explicitly has nothing to report for a section, which on save
/// wipes the corresponding remote collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub basic_info: Value,
    #[serde(default)]
    pub preferences: Value,
    #[serde(default)]
    pub education: Vec<LocalEntry>,
    #[serde(default)]
    pub work_experience: Vec<LocalEntry>,
    #[serde(default)]
    pub skills: Vec<LocalEntry>,
    #[serde(default)]
    pub projects: Vec<LocalEntry>,
    #[serde(default)]
    pub achievements: Vec<LocalEntry>,
    #[serde(default)]
    pub certifications: Vec<LocalEntry>,
    #[serde(default)]
    pub languages: Vec<LocalEntry>,
    /// "No work experience yet" — wipes the work-experience collection.
    #[serde(default)]
    pub is_fresher: bool,
    #[serde(default)]
    pub no_projects: bool,
    #[serde(default)]
    pub no_certifications: bool,
}

/// Top-level keys of the singleton (object) sections.
pub const OBJECT_SECTION_KEYS: &[&str] = &["basic_info", "preferences"];

/// Top-level keys of the list sections, in document order.
pub const LIST_SECTION_KEYS: &[&str] = &[
    "education",
    "work_experience",
    "skills",
    "projects",
    "achievements",
    "certifications",
    "languages",
];

impl ProfileDocument {
    pub fn entries(&self, collection: Collection) -> &[LocalEntry] {
        match collection {
            Collection::Education => &self.education,
            Collection::WorkExperience => &self.work_experience,
            Collection::Skills => &self.skills,
            Collection::Projects => &self.projects,
            Collection::Achievements => &self.achievements,
            Collection::Certifications => &self.certifications,
            Collection::Languages => &self.languages,
        }
    }

    pub fn entries_mut(&mut self, collection: Collection) -> &mut Vec<LocalEntry> {
        match collection {
            Collection::Education => &mut self.education,
            Collection::WorkExperience => &mut self.work_experience,
            Collection::Skills => &mut self.skills,
            Collection::Projects => &mut self.projects,
            Collection::Achievements => &mut self.achievements,
            Collection::Certifications => &mut self.certifications,
            Collection::Languages => &mut self.languages,
        }
    }

    /// The section-level "none" flag, where one exists for the collection.
    pub fn none_flag(&self, collection: Collection) -> bool {
        match collection {
            Collection::WorkExperience => self.is_fresher,
            Collection::Projects => self.no_projects,
            Collection::Certifications => self.no_certifications,
            _ => false,
        }
    }
}

/// The authoritative remote state of every collection, as returned inside
/// the full-profile response. This is what the diff planner compares
/// against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedProfile {
    #[serde(default)]
    pub education: Vec<RemoteRecord>,
    #[serde(default)]
    pub work_experience: Vec<RemoteRecord>,
    #[serde(default)]
    pub skills: Vec<RemoteRecord>,
    #[serde(default)]
    pub projects: Vec<RemoteRecord>,
    #[serde(default)]
    pub achievements: Vec<RemoteRecord>,
    #[serde(default)]
    pub certifications: Vec<RemoteRecord>,
    #[serde(default)]
    pub languages: Vec<RemoteRecord>,
}

impl VerifiedProfile {
    pub fn records(&self, collection: Collection) -> &[RemoteRecord] {
        match collection {
            Collection::Education => &self.education,
            Collection::WorkExperience => &self.work_experience,
            Collection::Skills => &self.skills,
            Collection::Projects => &self.projects,
            Collection::Achievements => &self.achievements,
            Collection::Certifications => &self.certifications,
            Collection::Languages => &self.languages,
        }
    }

    pub fn records_mut(&mut self, collection: Collection) -> &mut Vec<RemoteRecord> {
        match collection {
            Collection::Education => &mut self.education,
            Collection::WorkExperience => &mut self.work_experience,
            Collection::Skills => &mut self.skills,
            Collection::Projects => &mut self.projects,
            Collection::Achievements => &mut self.achievements,
            Collection::Certifications => &mut self.certifications,
            Collection::Languages => &mut self.languages,
        }
    }
}

/// Wire shape of `GET /profiles/{slug}/full/`: the denormalized document
/// plus the `verified_profile` sub-object with current remote state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullProfile {
    #[serde(default)]
    pub verified_profile: VerifiedProfile,
    #[serde(flatten)]
    pub document: ProfileDocument,
}
