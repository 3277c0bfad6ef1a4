//! Per-collection reconciliation rules.
//!
//! One table per profile section drives the whole pipeline: which API path
//! the collection lives under, which raw field spellings map to which
//! canonical name, how each field normalizes, and which fields are salient
//! for content-key matching. The planner and matcher are generic over these
//! tables, so adding a section is a table entry, not a new diff block.

use serde_json::{Map, Value};

use crate::normalize::{
    normalize_date, normalize_string, normalize_string_set, normalize_tristate, normalize_year,
};

/// A profile section stored remotely as an independent collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Education,
    WorkExperience,
    Skills,
    Projects,
    Achievements,
    Certifications,
    Languages,
}

/// How a field's raw value canonicalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Year,
    StringSet,
    TriState,
}

/// One domain field: its canonical name, the remote/legacy spellings that
/// alias it, and its normalization kind.
pub struct FieldRule {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

/// The reconciliation rules for one collection.
pub struct SectionRules {
    /// Canonical names whose values form the content key, in order.
    pub key_fields: &'static [&'static str],
    pub fields: &'static [FieldRule],
}

macro_rules! field {
    ($canonical:literal, [$($alias:literal),*], $kind:ident) => {
        FieldRule {
            canonical: $canonical,
            aliases: &[$($alias),*],
            kind: FieldKind::$kind,
        }
    };
}

static EDUCATION_RULES: SectionRules = SectionRules {
    key_fields: &["course", "institution"],
    fields: &[
        field!("course", ["course_name", "degree"], Text),
        field!("specialization", ["field_of_study", "stream"], Text),
        field!("institution", ["institute", "school", "college"], Text),
        field!("start_date", ["from_date"], Date),
        field!("end_date", ["to_date"], Date),
        field!("passing_year", ["graduation_year", "year_of_passing"], Year),
        field!("grade", ["score", "cgpa"], Text),
        field!("currently_studying", ["is_current", "pursuing"], TriState),
    ],
};

static WORK_EXPERIENCE_RULES: SectionRules = SectionRules {
    key_fields: &["designation", "company"],
    fields: &[
        field!("designation", ["job_title", "title", "role"], Text),
        field!("company", ["company_name", "organization", "employer"], Text),
        field!("location", ["city"], Text),
        field!("start_date", ["from_date"], Date),
        field!("end_date", ["to_date"], Date),
        field!("currently_working", ["is_current"], TriState),
        field!("description", ["details", "summary"], Text),
        field!("skills", ["skills_used", "tech_stack"], StringSet),
    ],
};

static SKILLS_RULES: SectionRules = SectionRules {
    key_fields: &["name"],
    fields: &[
        field!("name", ["skill", "skill_name"], Text),
        field!("level", ["proficiency", "rating"], Text),
    ],
};

static PROJECTS_RULES: SectionRules = SectionRules {
    key_fields: &["title"],
    fields: &[
        field!("title", ["name", "project_name"], Text),
        field!("description", ["details", "summary"], Text),
        field!("start_date", ["from_date"], Date),
        field!("end_date", ["to_date"], Date),
        field!("currently_working", ["is_current", "ongoing"], TriState),
        field!("link", ["url", "project_url"], Text),
        field!("skills", ["tech_stack", "technologies"], StringSet),
    ],
};

static ACHIEVEMENTS_RULES: SectionRules = SectionRules {
    key_fields: &["title", "issue_date"],
    fields: &[
        field!("title", ["name"], Text),
        field!("description", ["details"], Text),
        field!("issue_date", ["date", "awarded_on"], Date),
    ],
};

static CERTIFICATIONS_RULES: SectionRules = SectionRules {
    key_fields: &["name", "organization"],
    fields: &[
        field!("name", ["title", "certification_name"], Text),
        field!("organization", ["issuer", "issued_by", "authority"], Text),
        field!("issue_date", ["issued_on"], Date),
        field!("expiry_date", ["valid_till", "expires_on"], Date),
        field!("credential_id", ["certificate_id"], Text),
        field!("link", ["url", "credential_url"], Text),
    ],
};

static LANGUAGES_RULES: SectionRules = SectionRules {
    key_fields: &["name"],
    fields: &[
        field!("name", ["language"], Text),
        field!("proficiency", ["level", "fluency"], Text),
    ],
};

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Education,
        Collection::WorkExperience,
        Collection::Skills,
        Collection::Projects,
        Collection::Achievements,
        Collection::Certifications,
        Collection::Languages,
    ];

    /// Top-level key of this section in the profile document.
    pub fn doc_key(&self) -> &'static str {
        match self {
            Collection::Education => "education",
            Collection::WorkExperience => "work_experience",
            Collection::Skills => "skills",
            Collection::Projects => "projects",
            Collection::Achievements => "achievements",
            Collection::Certifications => "certifications",
            Collection::Languages => "languages",
        }
    }

    /// Sub-resource path segment on the remote API.
    pub fn api_path(&self) -> &'static str {
        match self {
            Collection::Education => "education",
            Collection::WorkExperience => "work-experience",
            Collection::Skills => "skills",
            Collection::Projects => "projects",
            Collection::Achievements => "achievements",
            Collection::Certifications => "certifications",
            Collection::Languages => "languages",
        }
    }

    pub fn rules(&self) -> &'static SectionRules {
        match self {
            Collection::Education => &EDUCATION_RULES,
            Collection::WorkExperience => &WORK_EXPERIENCE_RULES,
            Collection::Skills => &SKILLS_RULES,
            Collection::Projects => &PROJECTS_RULES,
            Collection::Achievements => &ACHIEVEMENTS_RULES,
            Collection::Certifications => &CERTIFICATIONS_RULES,
            Collection::Languages => &LANGUAGES_RULES,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_path())
    }
}

/// Resolves aliases and normalizes every known field of a raw entry object
/// into the canonical payload used for comparison and for writes.
///
/// Unknown fields are dropped; fields that normalize to nothing (empty
/// string, empty set, unset tri-state) are omitted, so a missing field and
/// a blank field compare equal.
pub fn canonical_fields(collection: Collection, raw: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for rule in collection.rules().fields {
        let Some(value) = lookup(raw, rule.canonical, rule.aliases) else {
            continue;
        };
        match rule.kind {
            FieldKind::Text => {
                let s = normalize_string(value.as_str().unwrap_or_default());
                if !s.is_empty() {
                    out.insert(rule.canonical.to_string(), Value::String(s));
                }
            }
            FieldKind::Date => {
                let s = normalize_date(value.as_str().unwrap_or_default());
                if !s.is_empty() {
                    out.insert(rule.canonical.to_string(), Value::String(s));
                }
            }
            FieldKind::Year => {
                let raw_text = match value {
                    Value::Number(n) => n.to_string(),
                    other => other.as_str().unwrap_or_default().to_string(),
                };
                let s = normalize_year(&raw_text);
                if !s.is_empty() {
                    out.insert(rule.canonical.to_string(), Value::String(s));
                }
            }
            FieldKind::StringSet => {
                let set = normalize_string_set(value);
                if !set.is_empty() {
                    out.insert(
                        rule.canonical.to_string(),
                        Value::Array(set.into_iter().map(Value::String).collect()),
                    );
                }
            }
            FieldKind::TriState => {
                if let Some(b) = normalize_tristate(value) {
                    out.insert(rule.canonical.to_string(), Value::Bool(b));
                }
            }
        }
    }
    out
}

fn lookup<'a>(
    raw: &'a Map<String, Value>,
    canonical: &str,
    aliases: &[&str],
) -> Option<&'a Value> {
    if let Some(v) = raw.get(canonical) {
        return Some(v);
    }
    aliases.iter().find_map(|a| raw.get(*a))
}
