#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;

impl SqliteStore {
    /// Flips the entire live subtree under `root_id` into one trash
    /// generation in a single statement, so the cascade becomes visible
    /// atomically at the store level. Each row's pre-trash parent is captured
    /// for audit. Returns the number of rows flipped.
    pub fn mark_subtree_trashed(
        &mut self,
        root_id: &str,
        trash_tx_id: &str,
        now_ms: i64,
    ) -> Result<usize, StoreError> {
        if trash_tx_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("trash_tx_id must not be empty"));
        }

        let flipped = self.conn.execute(
            r#"
            WITH RECURSIVE subtree(id) AS (
              SELECT id FROM knowledge_nodes WHERE id = ?1 AND is_trashed = 0
              UNION
              SELECT n.id
              FROM knowledge_nodes n
              JOIN subtree s ON n.parent_id = s.id AND n.is_trashed = 0
            )
            UPDATE knowledge_nodes
            SET is_trashed = 1,
                trashed_at_ms = ?3,
                trashed_parent_id = parent_id,
                trash_tx_id = ?2,
                updated_at_ms = ?3
            WHERE id IN (SELECT id FROM subtree)
            "#,
            params![root_id, trash_tx_id, now_ms],
        )?;

        Ok(flipped)
    }

    /// Reverses exactly one trash generation under `root_id`: only rows
    /// stamped with `trash_tx_id` are flipped back, in one statement.
    /// Returns the number of rows restored.
    pub fn mark_subtree_restored(
        &mut self,
        root_id: &str,
        trash_tx_id: &str,
        now_ms: i64,
    ) -> Result<usize, StoreError> {
        if trash_tx_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("trash_tx_id must not be empty"));
        }

        let restored = self.conn.execute(
            r#"
            WITH RECURSIVE subtree(id) AS (
              SELECT id FROM knowledge_nodes WHERE id = ?1 AND trash_tx_id = ?2
              UNION
              SELECT n.id
              FROM knowledge_nodes n
              JOIN subtree s ON n.parent_id = s.id AND n.trash_tx_id = ?2
            )
            UPDATE knowledge_nodes
            SET is_trashed = 0,
                trashed_at_ms = NULL,
                trashed_parent_id = NULL,
                trash_tx_id = NULL,
                updated_at_ms = ?3
            WHERE id IN (SELECT id FROM subtree)
            "#,
            params![root_id, trash_tx_id, now_ms],
        )?;

        Ok(restored)
    }
}
