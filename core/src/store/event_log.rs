use super::GameStore;
use crate::{error::EconomyResult, event::EventLogEntry};
use rusqlite::params;

impl GameStore {
    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> EconomyResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (profile_id, seq, subsystem, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
            params![
                entry.profile_id,
                entry.seq as i64,
                entry.subsystem,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_profile(&self, profile_id: &str) -> EconomyResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, seq, subsystem, event_type, payload
             FROM event_log WHERE profile_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![profile_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    profile_id: row.get(1)?,
                    seq: row.get::<_, i64>(2)? as u64,
                    subsystem: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Highest recorded seq for the profile, 0 when nothing is logged.
    pub fn last_event_seq(&self, profile_id: &str) -> EconomyResult<u64> {
        let seq: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM event_log WHERE profile_id = ?1",
            params![profile_id],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(seq).unwrap_or(0))
    }

    pub fn event_count(&self, profile_id: &str, event_type: &str) -> EconomyResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE profile_id = ?1 AND event_type = ?2",
            params![profile_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
