#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Records a display edge between two existing nodes. Duplicate triples
    /// are idempotent. Edges never affect tree shape.
    pub fn add_dependency(
        &mut self,
        source_id: &str,
        target_id: &str,
        kind: &str,
    ) -> Result<bool, StoreError> {
        if source_id == target_id {
            return Err(StoreError::InvalidInput(
                "dependency source and target must differ",
            ));
        }
        if kind.trim().is_empty() {
            return Err(StoreError::InvalidInput("dependency kind must not be empty"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        for id in [source_id, target_id] {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM knowledge_nodes WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !exists {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }

        let inserted = tx.execute(
            r#"
            INSERT OR IGNORE INTO knowledge_dependencies(source_id, target_id, kind, created_at_ms)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![source_id, target_id, kind, now_ms],
        )?;

        tx.commit()?;
        Ok(inserted > 0)
    }

    pub fn list_dependencies(&self) -> Result<Vec<DependencyRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT source_id, target_id, kind
            FROM knowledge_dependencies
            ORDER BY source_id, target_id, kind
            "#,
        )?;

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(DependencyRow {
                source_id: row.get(0)?,
                target_id: row.get(1)?,
                kind: row.get(2)?,
            });
        }
        Ok(out)
    }
}
