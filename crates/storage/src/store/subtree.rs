#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Walks the ancestor chain to the top and returns the root id, or
    /// `None` when the start id is unknown. The CTE uses `UNION` so cyclic
    /// parent data (out-of-band corruption) terminates instead of looping;
    /// a cycle with no root simply yields `None`.
    pub fn resolve_root_id(&self, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                r#"
                WITH RECURSIVE chain(id, parent_id) AS (
                  SELECT id, parent_id FROM knowledge_nodes WHERE id = ?1
                  UNION
                  SELECT n.id, n.parent_id
                  FROM knowledge_nodes n
                  JOIN chain c ON n.id = c.parent_id
                )
                SELECT id FROM chain WHERE parent_id IS NULL LIMIT 1
                "#,
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    /// All ids in the subtree rooted at `root_id`, root included, any trash
    /// state. Ordered for stable cascades and reporting.
    pub fn fetch_subtree_ids(&self, root_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            WITH RECURSIVE subtree(id) AS (
              SELECT id FROM knowledge_nodes WHERE id = ?1
              UNION
              SELECT n.id FROM knowledge_nodes n JOIN subtree s ON n.parent_id = s.id
            )
            SELECT id FROM subtree ORDER BY id
            "#,
        )?;

        let mut rows = stmt.query(params![root_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.get::<_, String>(0)?);
        }
        Ok(out)
    }

    /// Documents carried by live nodes of the live subtree under `root_id`.
    /// The traversal stops at trashed rows so an earlier, independent trash
    /// generation is never dragged into a new cascade.
    pub fn fetch_live_subtree_docs(&self, root_id: &str) -> Result<Vec<DocRef>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            WITH RECURSIVE subtree(id) AS (
              SELECT id FROM knowledge_nodes WHERE id = ?1 AND is_trashed = 0
              UNION
              SELECT n.id
              FROM knowledge_nodes n
              JOIN subtree s ON n.parent_id = s.id AND n.is_trashed = 0
            )
            SELECT k.id, k.doc_path
            FROM knowledge_nodes k
            JOIN subtree s ON k.id = s.id
            WHERE k.doc_path IS NOT NULL
            ORDER BY k.id
            "#,
        )?;

        let mut rows = stmt.query(params![root_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(DocRef {
                id: row.get(0)?,
                doc_path: row.get(1)?,
            });
        }
        Ok(out)
    }

    /// Documents belonging to one trash generation under `root_id`. Only rows
    /// stamped with exactly `trash_tx_id` participate; co-trashed descendants
    /// from other generations stay where they are.
    pub fn fetch_generation_docs(
        &self,
        root_id: &str,
        trash_tx_id: &str,
    ) -> Result<Vec<DocRef>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            WITH RECURSIVE subtree(id) AS (
              SELECT id FROM knowledge_nodes WHERE id = ?1 AND trash_tx_id = ?2
              UNION
              SELECT n.id
              FROM knowledge_nodes n
              JOIN subtree s ON n.parent_id = s.id AND n.trash_tx_id = ?2
            )
            SELECT k.id, k.doc_path
            FROM knowledge_nodes k
            JOIN subtree s ON k.id = s.id
            WHERE k.doc_path IS NOT NULL
            ORDER BY k.id
            "#,
        )?;

        let mut rows = stmt.query(params![root_id, trash_tx_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(DocRef {
                id: row.get(0)?,
                doc_path: row.get(1)?,
            });
        }
        Ok(out)
    }
}
