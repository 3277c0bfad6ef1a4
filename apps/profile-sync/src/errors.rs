//! Application-level error taxonomy for a sync pass.
//!
//! Validation failures are recovered by the caller (the user corrects the
//! form); an expired session aborts everything and asks for a fresh sign-in;
//! per-operation transport errors never reach this type — they ride along
//! inside the `SyncReport` instead.

use thiserror::Error;

use crate::api_client::ApiError;
use crate::reconcile::validation::ValidationReport;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed ({} issue(s))", .0.issues.len())]
    Validation(ValidationReport),

    #[error("session expired, please sign in again")]
    AuthExpired,

    /// A save pass is already in flight for this session; the caller
    /// retries after it settles instead of interleaving writes.
    #[error("another save is already in progress")]
    SaveInProgress,

    #[error("API error: {0}")]
    Api(ApiError),
}

impl From<ApiError> for SyncError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::AuthExpired => SyncError::AuthExpired,
            other => SyncError::Api(other),
        }
    }
}
