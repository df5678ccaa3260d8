#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;

impl SqliteStore {
    /// Live nodes that carry a document, with the hash recorded at the last
    /// resync. Input set for the hash-guarded content resync.
    pub fn list_document_nodes(&self) -> Result<Vec<DocSyncRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, doc_path, doc_hash
            FROM knowledge_nodes
            WHERE doc_path IS NOT NULL AND is_trashed = 0
            ORDER BY id
            "#,
        )?;

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(DocSyncRow {
                id: row.get(0)?,
                doc_path: row.get(1)?,
                doc_hash: row.get(2)?,
            });
        }
        Ok(out)
    }

    /// Refreshes the cached document body, derived summary and hash after a
    /// resync detected on-disk changes.
    pub fn update_doc_cache(
        &mut self,
        id: &str,
        summary: Option<&str>,
        doc_markdown: &str,
        doc_hash: &str,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            r#"
            UPDATE knowledge_nodes
            SET summary = ?2, doc_markdown = ?3, doc_hash = ?4, doc_synced_at_ms = ?5
            WHERE id = ?1 AND is_trashed = 0
            "#,
            params![id, summary, doc_markdown, doc_hash, now_ms],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
