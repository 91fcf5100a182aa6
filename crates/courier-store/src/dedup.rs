use tracing::warn;

use crate::error::StoreError;
use crate::DbHandle;

/// Admits each inbound event id at most once within a TTL window.
///
/// The primitive is an atomic conditional set with expiry: reclaim the row
/// if it has expired, then `INSERT OR IGNORE`. Exactly one concurrent
/// caller sees the insert succeed.
///
/// Fails **open**: if the store is unreachable the event is admitted, since
/// a duplicate reply is less harmful than a silently dropped question.
#[derive(Clone)]
pub struct EventGate {
    db: DbHandle,
    ttl_secs: u64,
}

impl EventGate {
    pub fn new(db: DbHandle, ttl_secs: u64) -> Self {
        Self { db, ttl_secs }
    }

    /// Returns `true` if the event id was newly admitted, `false` if it was
    /// already seen inside the TTL window.
    pub fn admit(&self, event_id: &str) -> bool {
        match self.try_admit(event_id) {
            Ok(admitted) => admitted,
            Err(e) => {
                warn!(error = %e, event_id, "dedup store unavailable; failing open");
                true
            }
        }
    }

    fn try_admit(&self, event_id: &str) -> Result<bool, StoreError> {
        let db = self.db.lock().unwrap();
        let now = chrono::Utc::now().timestamp();

        // Reclaim an expired row for this id so it can be re-admitted.
        db.execute(
            "DELETE FROM event_dedup WHERE event_id = ?1 AND expires_at <= ?2",
            rusqlite::params![event_id, now],
        )?;

        let inserted = db.execute(
            "INSERT OR IGNORE INTO event_dedup (event_id, expires_at) VALUES (?1, ?2)",
            rusqlite::params![event_id, now + self.ttl_secs as i64],
        )?;
        Ok(inserted == 1)
    }
}
