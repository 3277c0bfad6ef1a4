//! Bookkeeping for one resume-parsing attempt cycle.

#![allow(dead_code)]

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Where a parse cycle currently stands. `Parsing` covers both the trigger
/// request and the polling loop; everything else is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Idle,
    Parsing,
    Parsed,
    Failed,
    Timeout,
}

/// Why a parse cycle failed. Timeouts are a status of their own, not a
/// failure reason, because only timeouts get a retry affordance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureReason {
    /// Backend reported `failed`/`error`; carries its message.
    Backend(String),
    /// Status read `parsed` but nothing extractable came back.
    NoData,
}

/// State for one resume-parsing cycle. Created when parsing is triggered,
/// discarded once the caller has acted on the terminal status.
#[derive(Debug, Clone, Serialize)]
pub struct ParseSession {
    /// Correlation id for log lines; not sent to the backend.
    pub id: Uuid,
    pub slug: String,
    pub attempts_used: u32,
    pub status: ParseStatus,
    pub last_error: Option<ParseFailureReason>,
    /// The section-scoped patch recovered from parsed resume data.
    pub extracted: Option<Value>,
}

impl ParseSession {
    pub fn new(slug: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            attempts_used: 0,
            status: ParseStatus::Idle,
            last_error: None,
            extracted: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ParseStatus::Parsed | ParseStatus::Failed | ParseStatus::Timeout
        )
    }

    /// Retry is only offered when the attempt budget ran out; backend
    /// failures and empty results go straight to manual continuation.
    pub fn retryable(&self) -> bool {
        self.status == ParseStatus::Timeout
    }
}
