//! The per-session profile document store.
//!
//! Hydration is an explicit three-state machine (`Uninitialized → Loading →
//! Ready`) instead of a one-shot boolean guard, so re-entrancy is visible:
//! `begin_load` tells the caller whether it won the right to fetch, and a
//! document that is already `Ready` is never silently overwritten by a
//! second mount. Refreshing after a sync pass is a separate, deliberate
//! operation.

#![allow(dead_code)]

use tracing::debug;

use crate::models::profile::ProfileDocument;
use crate::parsing::merger::merge_document;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Uninitialized,
    Loading,
    Ready(ProfileDocument),
}

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    state: LoadState,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the load. Returns true exactly once per store lifetime; a
    /// second caller (double mount, test re-setup) gets false and must not
    /// fetch.
    pub fn begin_load(&mut self) -> bool {
        if self.state == LoadState::Uninitialized {
            self.state = LoadState::Loading;
            true
        } else {
            false
        }
    }

    /// Completes a load started with `begin_load`. Ignored when the store
    /// is already `Ready` — the first hydration wins.
    pub fn hydrate(&mut self, doc: ProfileDocument) -> bool {
        match self.state {
            LoadState::Ready(_) => {
                debug!("store already hydrated, ignoring");
                false
            }
            _ => {
                self.state = LoadState::Ready(doc);
                true
            }
        }
    }

    /// Replaces the document after a successful sync pass, when the local
    /// copy is refreshed from a full re-fetch rather than patched.
    pub fn replace(&mut self, doc: ProfileDocument) {
        self.state = LoadState::Ready(doc);
    }

    /// Merges a sparse patch into the held document. No-op unless `Ready`.
    pub fn apply_patch(&mut self, patch: &serde_json::Value) -> bool {
        if let LoadState::Ready(doc) = &self.state {
            let merged = merge_document(doc, patch);
            self.state = LoadState::Ready(merged);
            true
        } else {
            false
        }
    }

    pub fn document(&self) -> Option<&ProfileDocument> {
        match &self.state {
            LoadState::Ready(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn document_mut(&mut self) -> Option<&mut ProfileDocument> {
        match &mut self.state {
            LoadState::Ready(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }
}
