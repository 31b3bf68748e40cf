//! SQLite-backed persistence for consumption records.

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

use crate::exporters::hphc::HpHcRecord;

/// Database error types.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS hphc_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    papp_va INTEGER NOT NULL,
    hc_wh INTEGER NOT NULL,
    hp_wh INTEGER NOT NULL,
    is_hp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hphc_records_timestamp ON hphc_records (timestamp);
";

/// Connection wrapper owning schema initialization.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Persist one consumption record.
    pub fn insert_record(&self, record: &HpHcRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO hphc_records (timestamp, papp_va, hc_wh, hp_wh, is_hp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                record.timestamp.to_rfc3339(),
                record.papp_va,
                record.hc_wh,
                record.hp_wh,
                record.is_hp,
            ],
        )?;
        Ok(())
    }

    /// Number of stored records.
    pub fn record_count(&self) -> Result<u64> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM hphc_records", [], |row| row.get(0))?;
        Ok(count)
    }
}
