#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;

impl SqliteStore {
    /// Full listing for snapshot building and auditing. Roots come first,
    /// then siblings grouped by parent in sort order.
    pub fn list_nodes(&self, include_trashed: bool) -> Result<Vec<NodeRow>, StoreError> {
        let sql = format!(
            r#"
            SELECT {NODE_COLUMNS}
            FROM knowledge_nodes
            WHERE ?1 OR is_trashed = 0
            ORDER BY
              CASE WHEN parent_id IS NULL THEN 0 ELSE 1 END,
              parent_id,
              sort_order,
              id
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let mut rows = stmt.query(params![include_trashed])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(node_from_row(row)?);
        }
        Ok(out)
    }
}
