pub mod db;
pub mod dedup;
pub mod error;
pub mod mapping;
pub mod wscache;

pub use dedup::EventGate;
pub use error::StoreError;
pub use mapping::{InsertOutcome, MappingLookup, MappingStore, ThreadMapping};
pub use wscache::SharedWorkspaceCache;

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Shared handle to the courier SQLite database.
///
/// All store objects clone this handle; SQLite serialises writers, the
/// mutex serialises our statements on top of it.
pub type DbHandle = Arc<Mutex<Connection>>;

/// Open (or create) the database at `path` and run migrations.
pub fn open(path: &str) -> Result<DbHandle, StoreError> {
    if let Some(dir) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let conn = Connection::open(path)?;
    db::init_db(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database for tests.
pub fn open_in_memory() -> Result<DbHandle, StoreError> {
    let conn = Connection::open_in_memory()?;
    db::init_db(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}
