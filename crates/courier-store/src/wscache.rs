use rusqlite::OptionalExtension;

use crate::error::StoreError;
use crate::DbHandle;

/// Shared (cross-process) tier of the workspace-list cache.
///
/// A single row holding the last fetched slug list as JSON plus its fetch
/// time. Readers pass their own max age so TTLs stay with the owner of the
/// cache, not the storage.
#[derive(Clone)]
pub struct SharedWorkspaceCache {
    db: DbHandle,
}

impl SharedWorkspaceCache {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    /// Returns the cached slug list if it is younger than `max_age_secs`.
    pub fn load(&self, max_age_secs: u64) -> Result<Option<Vec<String>>, StoreError> {
        let db = self.db.lock().unwrap();
        let row: Option<(String, i64)> = db
            .query_row(
                "SELECT slugs, fetched_at FROM workspace_cache WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (slugs, fetched_at) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let age = chrono::Utc::now().timestamp() - fetched_at;
        if age >= max_age_secs as i64 {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&slugs)?))
    }

    pub fn store(&self, slugs: &[String]) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        let json = serde_json::to_string(slugs)?;
        db.execute(
            "INSERT INTO workspace_cache (id, slugs, fetched_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET slugs = ?1, fetched_at = ?2",
            rusqlite::params![json, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}
