//! In-memory `ProfileApi` for tests.
//!
//! Behaves like a minimal well-behaved backend: collections live in maps,
//! creates assign fresh identities, and parsing-status responses are
//! scripted. Failure injection covers the error paths the executor and
//! poller must handle (per-record transport failures, expired sessions).

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiError, ParsingStatus, ProfileApi};
use crate::models::profile::{FullProfile, ProfileDocument, RemoteRecord, VerifiedProfile};
use crate::reconcile::sections::Collection;

#[derive(Default)]
pub struct InMemoryProfileApi {
    records: Mutex<HashMap<Collection, Vec<RemoteRecord>>>,
    next_id: AtomicI64,
    /// Scripted parsing-status responses; the last entry repeats forever.
    statuses: Mutex<VecDeque<ParsingStatus>>,
    /// Every successful mutation, as `"create skills"`-style lines.
    ops_log: Mutex<Vec<String>>,
    /// When set, every call fails with `AuthExpired`.
    auth_expired: AtomicBool,
    /// Record ids whose update/delete fail with a transport-style error.
    fail_ids: Mutex<HashSet<i64>>,
}

impl InMemoryProfileApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn seed(&self, collection: Collection, records: Vec<RemoteRecord>) {
        let mut map = self.records.lock().unwrap();
        for r in &records {
            self.next_id.fetch_max(r.id + 1, Ordering::SeqCst);
        }
        map.insert(collection, records);
    }

    pub fn records(&self, collection: Collection) -> Vec<RemoteRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn script_statuses(&self, statuses: Vec<ParsingStatus>) {
        *self.statuses.lock().unwrap() = statuses.into();
    }

    pub fn expire_session(&self) {
        self.auth_expired.store(true, Ordering::SeqCst);
    }

    pub fn fail_record(&self, id: i64) {
        self.fail_ids.lock().unwrap().insert(id);
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops_log.lock().unwrap().clone()
    }

    fn gate(&self) -> Result<(), ApiError> {
        if self.auth_expired.load(Ordering::SeqCst) {
            Err(ApiError::AuthExpired)
        } else {
            Ok(())
        }
    }

    fn gate_record(&self, id: i64) -> Result<(), ApiError> {
        self.gate()?;
        if self.fail_ids.lock().unwrap().contains(&id) {
            return Err(ApiError::Api {
                status: 500,
                message: format!("injected failure for record {id}"),
            });
        }
        Ok(())
    }

    fn log(&self, line: String) {
        self.ops_log.lock().unwrap().push(line);
    }
}

#[async_trait]
impl ProfileApi for InMemoryProfileApi {
    async fn create_record(
        &self,
        collection: Collection,
        payload: &Value,
    ) -> Result<RemoteRecord, ApiError> {
        self.gate()?;
        let record = RemoteRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            fields: payload.as_object().cloned().unwrap_or_default(),
        };
        self.records
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .push(record.clone());
        self.log(format!("create {collection}"));
        Ok(record)
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: i64,
        payload: &Value,
    ) -> Result<(), ApiError> {
        self.gate_record(id)?;
        let mut map = self.records.lock().unwrap();
        let records = map.entry(collection).or_default();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Err(ApiError::Api {
                status: 404,
                message: format!("no record {id} in {collection}"),
            });
        };
        record.fields = payload.as_object().cloned().unwrap_or_default();
        drop(map);
        self.log(format!("update {collection} {id}"));
        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: i64) -> Result<(), ApiError> {
        self.gate_record(id)?;
        let mut map = self.records.lock().unwrap();
        let records = map.entry(collection).or_default();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(ApiError::Api {
                status: 404,
                message: format!("no record {id} in {collection}"),
            });
        }
        drop(map);
        self.log(format!("delete {collection} {id}"));
        Ok(())
    }

    async fn full_profile(&self, slug: &str) -> Result<FullProfile, ApiError> {
        self.gate()?;
        let map = self.records.lock().unwrap();
        let mut verified = VerifiedProfile::default();
        let mut document = ProfileDocument {
            slug: slug.to_string(),
            ..Default::default()
        };
        for collection in Collection::ALL {
            let records = map.get(&collection).cloned().unwrap_or_default();
            document.entries_mut(collection).extend(
                records
                    .iter()
                    .map(|r| crate::models::profile::LocalEntry::persisted(r.id, r.fields.clone())),
            );
            *verified.records_mut(collection) = records;
        }
        Ok(FullProfile {
            verified_profile: verified,
            document,
        })
    }

    async fn trigger_resume_parse(&self, _slug: &str) -> Result<(), ApiError> {
        self.gate()?;
        self.log("trigger parse".to_string());
        Ok(())
    }

    async fn parsing_status(&self, _slug: &str) -> Result<ParsingStatus, ApiError> {
        self.gate()?;
        self.log("poll status".to_string());
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.len() {
            0 => Ok(ParsingStatus::default()),
            1 => Ok(statuses.front().cloned().unwrap_or_default()),
            _ => Ok(statuses.pop_front().unwrap_or_default()),
        }
    }
}
