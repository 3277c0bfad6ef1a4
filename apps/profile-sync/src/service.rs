//! The save/parse orchestration layer.
//!
//! `SyncService` owns the API handle and runs the full save sequence:
//! validate locally, fetch the authoritative remote state, plan every
//! section, execute the plans, then re-fetch the whole profile so the
//! local document is refreshed rather than incrementally patched. A
//! try-lock single-flight guard keeps two save passes on the same session
//! from interleaving writes.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api_client::ProfileApi;
use crate::errors::SyncError;
use crate::models::parse::ParseSession;
use crate::models::profile::ProfileDocument;
use crate::parsing::poller::{run_parse_cycle, SessionGuard};
use crate::reconcile::executor::{execute, SyncReport};
use crate::reconcile::planner::plan_document;
use crate::reconcile::validation::validate_document;

/// Outcome of a save pass: what was applied, and the refreshed document
/// the session should adopt in place of its edited copy.
#[derive(Debug)]
pub struct SaveSummary {
    pub report: SyncReport,
    pub document: ProfileDocument,
}

pub struct SyncService {
    api: Arc<dyn ProfileApi>,
    save_lock: Mutex<()>,
}

impl SyncService {
    pub fn new(api: Arc<dyn ProfileApi>) -> Self {
        Self {
            api,
            save_lock: Mutex::new(()),
        }
    }

    /// Reconciles an edited document against the backend.
    ///
    /// Validation runs before anything touches the network; a failing
    /// report blocks the whole save. The remote state compared against is
    /// the `verified_profile` of a fresh full fetch, and after execution
    /// the document is re-fetched in full to avoid drift.
    pub async fn save(&self, doc: &ProfileDocument) -> Result<SaveSummary, SyncError> {
        let _guard = self
            .save_lock
            .try_lock()
            .map_err(|_| SyncError::SaveInProgress)?;

        let validation = validate_document(doc);
        if !validation.passed {
            return Err(SyncError::Validation(validation));
        }

        let full = self.api.full_profile(&doc.slug).await?;
        let plans = plan_document(doc, &full.verified_profile);
        debug!(slug = %doc.slug, sections = plans.len(), "planned sync pass");

        let report = execute(self.api.as_ref(), &plans).await?;
        info!(
            slug = %doc.slug,
            applied = report.applied.len(),
            errors = report.errors.len(),
            "sync pass finished"
        );

        let refreshed = self.api.full_profile(&doc.slug).await?;
        Ok(SaveSummary {
            report,
            document: refreshed.document,
        })
    }

    /// Runs one resume-parse cycle. The guard belongs to the initiating
    /// context; results arriving after it is dismissed are dropped.
    pub async fn parse_resume(
        &self,
        slug: &str,
        guard: &SessionGuard,
    ) -> Result<ParseSession, SyncError> {
        let session = run_parse_cycle(self.api.as_ref(), slug, guard).await?;
        Ok(session)
    }

    /// Hydration fetch for a fresh editing session.
    pub async fn load(&self, slug: &str) -> Result<ProfileDocument, SyncError> {
        let full = self.api.full_profile(slug).await?;
        Ok(full.document)
    }
}
