//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Subsystems persist through a `ProfileStore` handle; they never
//! execute SQL directly.
//!
//! The economy only needs a key-value store: typed entries addressed
//! by `(profile_id, key)`, plus an append-only event log for tooling.

use crate::error::EconomyResult;
use rusqlite::{params, Connection, OptionalExtension};

mod event_log;
pub mod keys;
mod kv;
mod profile;

pub use kv::ValueKind;
pub use profile::ProfileStore;

pub struct GameStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl GameStore {
    pub fn open(path: &str) -> EconomyResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EconomyResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases this returns a fresh, isolated database.
    pub fn reopen(&self) -> EconomyResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EconomyResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Profile ────────────────────────────────────────────────

    /// Register a profile if it does not exist yet.
    /// Returns true when the profile was created by this call.
    pub fn ensure_profile(&self, profile_id: &str, version: &str) -> EconomyResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO profile (profile_id, created_at, version)
             VALUES (?1, datetime('now'), ?2)",
            params![profile_id, version],
        )?;
        Ok(inserted > 0)
    }

    pub fn profile_exists(&self, profile_id: &str) -> EconomyResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM profile WHERE profile_id = ?1",
                params![profile_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn profile_ids(&self) -> EconomyResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT profile_id FROM profile ORDER BY created_at ASC, profile_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}
