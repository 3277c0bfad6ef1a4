//! Resume-parse polling state machine.
//!
//! One cycle: trigger background parsing, then poll the status endpoint on
//! a fixed interval until the backend reports a terminal status or the
//! attempt budget runs out. The first status check fires immediately after
//! the trigger — the backend only begins processing once a status check is
//! observed.
//!
//! States: idle → triggering → polling → {parsed, failed, timeout}. An
//! explicit retry simply runs a fresh cycle; the poller never retries a
//! terminal outcome on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api_client::{ApiError, ProfileApi};
use crate::models::parse::{ParseFailureReason, ParseSession, ParseStatus};
use crate::models::profile::{LIST_SECTION_KEYS, OBJECT_SECTION_KEYS};

/// Fixed delay between status checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Bounded attempt budget: 20 checks at 1.5 s apart is a 30 s ceiling.
pub const MAX_POLL_ATTEMPTS: u32 = 20;

/// Liveness flag for the context that started a parse cycle.
///
/// Dismissing the guard does not cancel the in-flight request; it only
/// stops the poller from acting on whatever arrives afterwards, so a
/// late result can never touch a document whose owning view is gone.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    dismissed: Arc<AtomicBool>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&self) {
        self.dismissed.store(true, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        !self.dismissed.load(Ordering::SeqCst)
    }
}

/// Runs one full parse cycle and returns the resolved session.
///
/// The returned session is terminal unless the guard was dismissed
/// mid-cycle, in which case it is returned as-is (still `Parsing`) and the
/// caller must not merge anything from it. Only the trigger request
/// propagates transport errors; a failed status check mid-poll is charged
/// against the attempt budget like any other check.
pub async fn run_parse_cycle(
    api: &dyn ProfileApi,
    slug: &str,
    guard: &SessionGuard,
) -> Result<ParseSession, ApiError> {
    let mut session = ParseSession::new(slug);
    info!(session = %session.id, slug, "triggering resume parse");

    api.trigger_resume_parse(slug).await?;
    session.status = ParseStatus::Parsing;

    for attempt in 1..=MAX_POLL_ATTEMPTS {
        session.attempts_used = attempt;

        let status = match api.parsing_status(slug).await {
            Ok(s) => Some(s),
            Err(ApiError::AuthExpired) => return Err(ApiError::AuthExpired),
            Err(e) => {
                warn!(session = %session.id, attempt, error = %e, "status check failed");
                None
            }
        };

        if !guard.is_live() {
            debug!(session = %session.id, "context dismissed, dropping result");
            return Ok(session);
        }

        if let Some(status) = status {
            match status.parsing_status.as_str() {
                "parsed" => {
                    let patch = extract_patch(&status.extra);
                    if patch.as_object().map(|o| o.is_empty()).unwrap_or(true) {
                        session.status = ParseStatus::Failed;
                        session.last_error = Some(ParseFailureReason::NoData);
                    } else {
                        session.status = ParseStatus::Parsed;
                        session.extracted = Some(patch);
                    }
                    return Ok(session);
                }
                "failed" | "error" => {
                    session.status = ParseStatus::Failed;
                    session.last_error =
                        Some(ParseFailureReason::Backend(backend_message(&status.extra)));
                    return Ok(session);
                }
                // "parsing", or anything unrecognized: keep polling.
                other => {
                    debug!(session = %session.id, attempt, status = other, "still parsing");
                }
            }
        }

        if attempt < MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
            if !guard.is_live() {
                debug!(session = %session.id, "context dismissed during wait");
                return Ok(session);
            }
        }
    }

    session.status = ParseStatus::Timeout;
    warn!(session = %session.id, attempts = session.attempts_used, "parse timed out");
    Ok(session)
}

/// Pulls the recognized profile sections out of a status payload, dropping
/// empty values, so the result is a merge-ready sparse patch.
fn extract_patch(extra: &Map<String, Value>) -> Value {
    let mut patch = Map::new();
    for key in OBJECT_SECTION_KEYS.iter().chain(LIST_SECTION_KEYS) {
        let Some(value) = extra.get(*key) else {
            continue;
        };
        let keep = match value {
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
            _ => false,
        };
        if keep {
            patch.insert((*key).to_string(), value.clone());
        }
    }
    Value::Object(patch)
}

fn backend_message(extra: &Map<String, Value>) -> String {
    for key in ["error", "message", "detail"] {
        if let Some(msg) = extra.get(key).and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    "resume parsing failed".to_string()
}
