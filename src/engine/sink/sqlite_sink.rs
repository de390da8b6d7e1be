//! SQLite sink: one row per record, each insert committed on its own.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use super::RecordSink;
use crate::types::Record;

/// WAL tuning pragmas. Use after PRAGMA journal_mode = WAL. FULL syncs the WAL on every
/// auto-committed insert, so each record survives power loss once written.
const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = FULL;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Records table. No key: re-runs append duplicates.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER NOT NULL,
    key TEXT NOT NULL,
    field TEXT NOT NULL,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_key ON records(key);
"#;

const INSERT_RECORD_SQL: &str =
    "INSERT INTO records (seq, key, field, value) VALUES (?1, ?2, ?3, ?4)";

pub struct SqliteSink {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteSink {
    /// Open or create the database at `path` with WAL and the records schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open database {}", path.display()))?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .context("enable WAL")?;
        conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
        conn.execute_batch(SCHEMA).context("create schema")?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory database with the same schema.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        conn.execute_batch(SCHEMA).context("create schema")?;
        Ok(Self { conn, path: None })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordSink for SqliteSink {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached(INSERT_RECORD_SQL)
            .context("prepare insert")?;
        stmt.execute((record.seq as i64, record.key, record.field, record.value))
            .context("insert record")?;
        Ok(())
    }

    fn destination(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => ":memory:".to_string(),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.path.is_some() {
            self.conn
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
                .context("checkpoint WAL")?;
        }
        Ok(())
    }
}
