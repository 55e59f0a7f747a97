//! Profile-scoped store handle handed to every subsystem.
//!
//! Writes are fire-and-forget: the caller never waits on or handles a
//! durable-write failure. Failures are logged and the in-memory state
//! stays authoritative for the rest of the session.
//!
//! Reads fall back: a missing, mistyped or undecodable record yields
//! `None` so the owning subsystem can substitute its catalog defaults.

use super::GameStore;
use crate::{
    error::{EconomyError, EconomyResult},
    types::ProfileId,
};
use serde::{de::DeserializeOwned, Serialize};
use std::rc::Rc;

#[derive(Clone)]
pub struct ProfileStore {
    store: Rc<GameStore>,
    profile_id: ProfileId,
}

impl ProfileStore {
    pub fn new(store: Rc<GameStore>, profile_id: ProfileId) -> Self {
        Self { store, profile_id }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    // ── Writes ─────────────────────────────────────────────────

    pub fn write_int(&self, key: &str, value: i64) {
        self.report(key, self.store.set_int(&self.profile_id, key, value));
    }

    pub fn write_string(&self, key: &str, value: &str) {
        self.report(key, self.store.set_string(&self.profile_id, key, value));
    }

    pub fn write_int_array(&self, key: &str, values: &[i64]) {
        self.report(key, self.store.set_int_array(&self.profile_id, key, values));
    }

    pub fn write_string_array(&self, key: &str, values: &[String]) {
        self.report(key, self.store.set_string_array(&self.profile_id, key, values));
    }

    pub fn clear(&self, key: &str) {
        self.report(key, self.store.remove(&self.profile_id, key));
    }

    /// Encode a structured record as JSON bytes into a blob entry.
    pub fn write_record<T: Serialize>(&self, key: &str, record: &T) {
        let result = serde_json::to_vec(record)
            .map_err(EconomyError::from)
            .and_then(|bytes| self.store.set_blob(&self.profile_id, key, &bytes));
        self.report(key, result);
    }

    // ── Reads ──────────────────────────────────────────────────

    pub fn read_int(&self, key: &str) -> Option<i64> {
        self.recover(key, self.store.get_int(&self.profile_id, key))
    }

    pub fn read_string(&self, key: &str) -> Option<String> {
        self.recover(key, self.store.get_string(&self.profile_id, key))
    }

    pub fn read_int_array(&self, key: &str) -> Option<Vec<i64>> {
        self.recover(key, self.store.get_int_array(&self.profile_id, key))
    }

    pub fn read_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.recover(key, self.store.get_string_array(&self.profile_id, key))
    }

    /// Decode a structured record written by `write_record`.
    pub fn read_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.recover(key, self.store.get_blob(&self.profile_id, key))?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("profile={} key={key}: undecodable record, using defaults: {e}", self.profile_id);
                None
            }
        }
    }

    fn report(&self, key: &str, result: EconomyResult<()>) {
        if let Err(e) = result {
            log::warn!("profile={} key={key}: write failed: {e}", self.profile_id);
        }
    }

    fn recover<T>(&self, key: &str, result: EconomyResult<Option<T>>) -> Option<T> {
        result.unwrap_or_else(|e| {
            log::warn!("profile={} key={key}: read failed, using defaults: {e}", self.profile_id);
            None
        })
    }
}
