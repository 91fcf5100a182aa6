use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::StoreError;
use crate::DbHandle;

/// A chat thread bound to a persistent remote LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMapping {
    pub channel_id: String,
    pub thread_root: String,
    pub workspace: String,
    pub remote_thread_id: String,
    pub created_at: String,
    pub last_accessed_at: String,
}

/// Explicit lookup result so callers handle both branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingLookup {
    Found(ThreadMapping),
    Missing,
}

/// Result of an insert-if-absent attempt. `Lost` carries the surviving
/// row written by a concurrent winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(ThreadMapping),
    Lost(ThreadMapping),
}

/// Persistent (channel, thread root) → remote conversation table.
///
/// The `UNIQUE(channel_id, thread_root)` constraint plus
/// `ON CONFLICT DO NOTHING` is the only mutual exclusion in the pipeline:
/// first successful insert wins, later inserts are no-ops.
#[derive(Clone)]
pub struct MappingStore {
    db: DbHandle,
}

impl MappingStore {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    pub fn lookup(&self, channel_id: &str, thread_root: &str) -> Result<MappingLookup, StoreError> {
        let db = self.db.lock().unwrap();
        match fetch(&db, channel_id, thread_root)? {
            Some(mapping) => Ok(MappingLookup::Found(mapping)),
            None => Ok(MappingLookup::Missing),
        }
    }

    /// Insert a new mapping unless one already exists, then re-read the
    /// surviving row so the caller always gets the winner.
    pub fn insert_if_absent(
        &self,
        channel_id: &str,
        thread_root: &str,
        workspace: &str,
        remote_thread_id: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let db = self.db.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = db.execute(
            "INSERT INTO thread_mappings
             (channel_id, thread_root, workspace, remote_thread_id, created_at, last_accessed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(channel_id, thread_root) DO NOTHING",
            rusqlite::params![channel_id, thread_root, workspace, remote_thread_id, now],
        )?;

        // Mappings are never deleted, so the row must exist here.
        let row = fetch(&db, channel_id, thread_root)?
            .ok_or(StoreError::Database(rusqlite::Error::QueryReturnedNoRows))?;

        if inserted == 1 {
            Ok(InsertOutcome::Inserted(row))
        } else {
            debug!(
                channel_id,
                thread_root, "lost mapping insert race; using surviving row"
            );
            Ok(InsertOutcome::Lost(row))
        }
    }

    /// Refresh `last_accessed_at`. Callers treat this as best-effort.
    pub fn touch_last_access(&self, channel_id: &str, thread_root: &str) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE thread_mappings SET last_accessed_at = ?1
             WHERE channel_id = ?2 AND thread_root = ?3",
            rusqlite::params![chrono::Utc::now().to_rfc3339(), channel_id, thread_root],
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        let db = self.db.lock().unwrap();
        db.query_row("SELECT COUNT(*) FROM thread_mappings", [], |row| row.get(0))
            .map(|n: i64| n as usize)
            .unwrap_or(0)
    }
}

fn fetch(
    db: &Connection,
    channel_id: &str,
    thread_root: &str,
) -> Result<Option<ThreadMapping>, StoreError> {
    let row = db
        .query_row(
            "SELECT channel_id, thread_root, workspace, remote_thread_id,
                    created_at, last_accessed_at
             FROM thread_mappings
             WHERE channel_id = ?1 AND thread_root = ?2",
            rusqlite::params![channel_id, thread_root],
            |row| {
                Ok(ThreadMapping {
                    channel_id: row.get(0)?,
                    thread_root: row.get(1)?,
                    workspace: row.get(2)?,
                    remote_thread_id: row.get(3)?,
                    created_at: row.get(4)?,
                    last_accessed_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}
