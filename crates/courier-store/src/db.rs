use rusqlite::{Connection, Result};

/// Initialise courier tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_thread_mappings_table(conn)?;
    create_event_dedup_table(conn)?;
    create_workspace_cache_table(conn)?;
    Ok(())
}

/// One row per chat thread bound to a remote LLM conversation.
/// Rows are created at most once and never deleted; only
/// `last_accessed_at` is refreshed afterwards.
fn create_thread_mappings_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS thread_mappings (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id       TEXT NOT NULL,
            thread_root      TEXT NOT NULL,
            workspace        TEXT NOT NULL,
            remote_thread_id TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            last_accessed_at TEXT NOT NULL,
            UNIQUE(channel_id, thread_root)
        );
        CREATE INDEX IF NOT EXISTS idx_mappings_channel
            ON thread_mappings(channel_id);",
    )
}

/// Seen event ids. Presence of an unexpired row means already handled.
/// `expires_at` is unix seconds; expired rows are reclaimed lazily.
fn create_event_dedup_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS event_dedup (
            event_id   TEXT PRIMARY KEY,
            expires_at INTEGER NOT NULL
        );",
    )
}

/// Shared tier of the workspace-list cache. Single row, overwritten on
/// every refresh; `slugs` is a JSON array of workspace identifiers.
fn create_workspace_cache_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS workspace_cache (
            id         INTEGER PRIMARY KEY CHECK (id = 1),
            slugs      TEXT NOT NULL,
            fetched_at INTEGER NOT NULL
        );",
    )
}
