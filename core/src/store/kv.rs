//! Typed key-value entries.
//!
//! Scalars go into the `value` column natively (INTEGER, TEXT, BLOB);
//! arrays are stored as JSON text. A read with the wrong kind yields
//! `None` rather than a reinterpreted value.

use super::GameStore;
use crate::error::EconomyResult;
use rusqlite::{params, types::Value, OptionalExtension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    String,
    Blob,
    IntArray,
    StringArray,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Blob => "blob",
            Self::IntArray => "int_array",
            Self::StringArray => "string_array",
        }
    }
}

impl GameStore {
    fn put_value(&self, profile_id: &str, key: &str, kind: ValueKind, value: Value) -> EconomyResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entry (profile_id, key, kind, value, updated_at)
             VALUES (?1, ?2, ?3, ?4, datetime('now'))
             ON CONFLICT (profile_id, key) DO UPDATE
             SET kind = excluded.kind, value = excluded.value, updated_at = excluded.updated_at",
            params![profile_id, key, kind.as_str(), value],
        )?;
        Ok(())
    }

    fn get_value(&self, profile_id: &str, key: &str, kind: ValueKind) -> EconomyResult<Option<Value>> {
        let row: Option<(String, Value)> = self
            .conn
            .query_row(
                "SELECT kind, value FROM kv_entry WHERE profile_id = ?1 AND key = ?2",
                params![profile_id, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((stored, value)) if stored == kind.as_str() => Ok(Some(value)),
            Some((stored, _)) => {
                log::warn!("key {key}: stored as {stored}, read as {}", kind.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn kind_of(&self, profile_id: &str, key: &str) -> EconomyResult<Option<String>> {
        let kind = self
            .conn
            .query_row(
                "SELECT kind FROM kv_entry WHERE profile_id = ?1 AND key = ?2",
                params![profile_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(kind)
    }

    pub fn remove(&self, profile_id: &str, key: &str) -> EconomyResult<()> {
        self.conn.execute(
            "DELETE FROM kv_entry WHERE profile_id = ?1 AND key = ?2",
            params![profile_id, key],
        )?;
        Ok(())
    }

    // ── Scalars ────────────────────────────────────────────────

    pub fn set_int(&self, profile_id: &str, key: &str, value: i64) -> EconomyResult<()> {
        self.put_value(profile_id, key, ValueKind::Int, Value::Integer(value))
    }

    pub fn get_int(&self, profile_id: &str, key: &str) -> EconomyResult<Option<i64>> {
        Ok(match self.get_value(profile_id, key, ValueKind::Int)? {
            Some(Value::Integer(i)) => Some(i),
            _ => None,
        })
    }

    pub fn set_string(&self, profile_id: &str, key: &str, value: &str) -> EconomyResult<()> {
        self.put_value(profile_id, key, ValueKind::String, Value::Text(value.to_string()))
    }

    pub fn get_string(&self, profile_id: &str, key: &str) -> EconomyResult<Option<String>> {
        Ok(match self.get_value(profile_id, key, ValueKind::String)? {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        })
    }

    pub fn set_blob(&self, profile_id: &str, key: &str, value: &[u8]) -> EconomyResult<()> {
        self.put_value(profile_id, key, ValueKind::Blob, Value::Blob(value.to_vec()))
    }

    pub fn get_blob(&self, profile_id: &str, key: &str) -> EconomyResult<Option<Vec<u8>>> {
        Ok(match self.get_value(profile_id, key, ValueKind::Blob)? {
            Some(Value::Blob(b)) => Some(b),
            _ => None,
        })
    }

    // ── Arrays ─────────────────────────────────────────────────

    pub fn set_int_array(&self, profile_id: &str, key: &str, values: &[i64]) -> EconomyResult<()> {
        let json = serde_json::to_string(values)?;
        self.put_value(profile_id, key, ValueKind::IntArray, Value::Text(json))
    }

    pub fn get_int_array(&self, profile_id: &str, key: &str) -> EconomyResult<Option<Vec<i64>>> {
        match self.get_value(profile_id, key, ValueKind::IntArray)? {
            Some(Value::Text(json)) => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }

    pub fn set_string_array(&self, profile_id: &str, key: &str, values: &[String]) -> EconomyResult<()> {
        let json = serde_json::to_string(values)?;
        self.put_value(profile_id, key, ValueKind::StringArray, Value::Text(json))
    }

    pub fn get_string_array(&self, profile_id: &str, key: &str) -> EconomyResult<Option<Vec<String>>> {
        match self.get_value(profile_id, key, ValueKind::StringArray)? {
            Some(Value::Text(json)) => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }
}
