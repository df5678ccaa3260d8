#![forbid(unsafe_code)]

mod dependencies;
mod docs;
mod error;
mod list;
mod nodes;
mod subtree;
mod trash;
mod types;

pub use error::StoreError;
pub use types::*;

use kn_core::model::NodeKind;
use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILE_NAME: &str = "knowledge.db";

const NODE_COLUMNS: &str = "id, label, kind, summary, color, parent_id, doc_path, doc_markdown, \
                            doc_hash, doc_synced_at_ms, sort_order, is_trashed, trashed_at_ms, \
                            trashed_parent_id, trash_tx_id, created_at_ms, updated_at_ms";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS knowledge_nodes (
          id TEXT PRIMARY KEY,
          label TEXT NOT NULL,
          kind TEXT NOT NULL CHECK(kind IN ('folder','leaf')),
          summary TEXT,
          color TEXT,
          parent_id TEXT,
          doc_path TEXT,
          doc_markdown TEXT,
          doc_hash TEXT,
          doc_synced_at_ms INTEGER,
          sort_order INTEGER NOT NULL DEFAULT 0,
          is_trashed INTEGER NOT NULL DEFAULT 0,
          trashed_at_ms INTEGER,
          trashed_parent_id TEXT,
          trash_tx_id TEXT,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          CHECK(parent_id IS NULL OR parent_id <> id),
          CHECK((is_trashed = 0) = (trash_tx_id IS NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_parent
          ON knowledge_nodes(parent_id, sort_order, id);
        CREATE INDEX IF NOT EXISTS idx_nodes_trash_tx
          ON knowledge_nodes(trash_tx_id);

        CREATE TABLE IF NOT EXISTS knowledge_dependencies (
          source_id TEXT NOT NULL,
          target_id TEXT NOT NULL,
          kind TEXT NOT NULL DEFAULT 'related',
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (source_id, target_id, kind),
          CHECK(source_id <> target_id)
        );
        "#,
    )?;
    Ok(())
}

fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRow> {
    let kind_raw: String = row.get(2)?;
    let kind = NodeKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown node kind: {kind_raw}").into(),
        )
    })?;
    Ok(NodeRow {
        id: row.get(0)?,
        label: row.get(1)?,
        kind,
        summary: row.get(3)?,
        color: row.get(4)?,
        parent_id: row.get(5)?,
        doc_path: row.get(6)?,
        doc_markdown: row.get(7)?,
        doc_hash: row.get(8)?,
        doc_synced_at_ms: row.get(9)?,
        sort_order: row.get(10)?,
        is_trashed: row.get(11)?,
        trashed_at_ms: row.get(12)?,
        trashed_parent_id: row.get(13)?,
        trash_tx_id: row.get(14)?,
        created_at_ms: row.get(15)?,
        updated_at_ms: row.get(16)?,
    })
}

fn map_insert_conflict(err: rusqlite::Error, id: &str) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::DuplicateId(id.to_string());
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
