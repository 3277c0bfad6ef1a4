//! Executes planned diff operations against the remote API.
//!
//! Within one collection operations run strictly create → update → delete,
//! sequentially awaited, so a delete never removes a record a preceding
//! create just re-created under a fresh identity. Transport errors are
//! best-effort: one failed operation does not halt its siblings. An expired
//! session aborts the entire pass immediately.

use tracing::{debug, warn};

use crate::api_client::{ApiError, ProfileApi};
use crate::errors::SyncError;
use crate::reconcile::planner::{DiffOp, SectionPlan};
use crate::reconcile::sections::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        })
    }
}

/// One successfully applied operation. `id` is the remote identity the
/// operation touched (for creates, the identity the backend assigned).
#[derive(Debug, Clone)]
pub struct AppliedOp {
    pub collection: Collection,
    pub kind: OpKind,
    pub id: Option<i64>,
}

/// One failed operation, recorded without halting the pass.
#[derive(Debug, Clone)]
pub struct OpError {
    pub collection: Collection,
    pub kind: OpKind,
    pub id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub applied: Vec<AppliedOp>,
    pub errors: Vec<OpError>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs every plan against the API.
///
/// Only an authentication failure turns into an `Err`; everything else is
/// reported per-operation in the returned `SyncReport`.
pub async fn execute(api: &dyn ProfileApi, plans: &[SectionPlan]) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    for plan in plans {
        let mut ops: Vec<&DiffOp> = plan.ops.iter().collect();
        ops.sort_by_key(|op| op.rank());

        debug!(collection = %plan.collection, ops = ops.len(), "executing section plan");
        for op in ops {
            apply_op(api, plan.collection, op, &mut report).await?;
        }
    }

    Ok(report)
}

async fn apply_op(
    api: &dyn ProfileApi,
    collection: Collection,
    op: &DiffOp,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    let (kind, id, result) = match op {
        DiffOp::Create(payload) => {
            let result = api.create_record(collection, payload).await;
            match result {
                Ok(record) => (OpKind::Create, Some(record.id), Ok(())),
                Err(e) => (OpKind::Create, None, Err(e)),
            }
        }
        DiffOp::Update(id, payload) => (
            OpKind::Update,
            Some(*id),
            api.update_record(collection, *id, payload).await,
        ),
        DiffOp::Delete(id) => (
            OpKind::Delete,
            Some(*id),
            api.delete_record(collection, *id).await,
        ),
    };

    match result {
        Ok(()) => report.applied.push(AppliedOp {
            collection,
            kind,
            id,
        }),
        Err(ApiError::AuthExpired) => {
            warn!(%collection, %kind, "session expired mid-pass, aborting");
            return Err(SyncError::AuthExpired);
        }
        Err(e) => {
            warn!(%collection, %kind, ?id, error = %e, "operation failed, continuing");
            report.errors.push(OpError {
                collection,
                kind,
                id,
                message: e.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::InMemoryProfileApi;
    use crate::reconcile::planner::plan_section;
    use crate::models::profile::{LocalEntry, RemoteRecord};
    use serde_json::json;

    fn entry(id: Option<i64>, fields: serde_json::Value) -> LocalEntry {
        LocalEntry {
            id,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    fn record(id: i64, fields: serde_json::Value) -> RemoteRecord {
        RemoteRecord {
            id,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_operations_run_create_update_delete() {
        let api = InMemoryProfileApi::new();
        api.seed(
            Collection::Skills,
            vec![
                record(1, json!({"name": "Rust"})),
                record(2, json!({"name": "COBOL"})),
            ],
        );
        let local = vec![
            entry(Some(1), json!({"name": "Rust", "level": "Expert"})),
            entry(None, json!({"name": "Go"})),
        ];
        let plan = plan_section(
            Collection::Skills,
            &local,
            &api.records(Collection::Skills),
            false,
        );

        let report = execute(&api, &[plan]).await.unwrap();
        assert!(report.is_clean());

        let mutations: Vec<String> = api
            .ops()
            .into_iter()
            .filter(|op| !op.starts_with("poll") && !op.starts_with("trigger"))
            .collect();
        assert_eq!(
            mutations,
            vec!["create skills", "update skills 1", "delete skills 2"]
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_halt_siblings() {
        let api = InMemoryProfileApi::new();
        api.seed(
            Collection::Skills,
            vec![
                record(1, json!({"name": "A"})),
                record(2, json!({"name": "B"})),
            ],
        );
        api.fail_record(1);

        let plan = SectionPlan {
            collection: Collection::Skills,
            ops: vec![DiffOp::Delete(1), DiffOp::Delete(2)],
        };
        let report = execute(&api, &[plan]).await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id, Some(1));
        assert_eq!(report.applied.len(), 1);
        assert!(api.records(Collection::Skills).iter().all(|r| r.id == 1));
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_pass() {
        let api = InMemoryProfileApi::new();
        api.expire_session();

        let plan = SectionPlan {
            collection: Collection::Skills,
            ops: vec![DiffOp::Create(json!({"name": "Rust"}))],
        };
        let err = execute(&api, &[plan]).await.unwrap_err();
        assert!(matches!(err, SyncError::AuthExpired));
    }

    #[tokio::test]
    async fn test_create_reports_assigned_identity() {
        let api = InMemoryProfileApi::new();
        let plan = SectionPlan {
            collection: Collection::Languages,
            ops: vec![DiffOp::Create(json!({"name": "French"}))],
        };
        let report = execute(&api, &[plan]).await.unwrap();
        assert_eq!(report.applied.len(), 1);
        assert!(report.applied[0].id.is_some());
    }
}
