#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Inserts a structural row. The id namespace covers trashed rows too:
    /// ids are never reused.
    pub fn insert_node(&mut self, request: NewNodeRequest) -> Result<NodeRow, StoreError> {
        if request.label.trim().is_empty() {
            return Err(StoreError::InvalidInput("label must not be empty"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let insert = tx.execute(
            r#"
            INSERT INTO knowledge_nodes(id, label, kind, summary, color, parent_id, doc_path,
                                        sort_order, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
            params![
                request.id,
                request.label,
                request.kind.as_str(),
                request.summary,
                request.color,
                request.parent_id,
                request.doc_path,
                request.sort_order,
                now_ms
            ],
        );

        if let Err(err) = insert {
            return Err(map_insert_conflict(err, &request.id));
        }

        tx.commit()?;
        Ok(NodeRow {
            id: request.id,
            label: request.label,
            kind: request.kind,
            summary: request.summary,
            color: request.color,
            parent_id: request.parent_id,
            doc_path: request.doc_path,
            doc_markdown: None,
            doc_hash: None,
            doc_synced_at_ms: None,
            sort_order: request.sort_order,
            is_trashed: false,
            trashed_at_ms: None,
            trashed_parent_id: None,
            trash_tx_id: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        })
    }

    /// Applies a field patch to a live row. Trashed rows are invisible here;
    /// they must be restored first.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<NodeRow, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::InvalidInput("no fields to update"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let current = tx
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM knowledge_nodes WHERE id = ?1 AND is_trashed = 0"),
                params![id],
                node_from_row,
            )
            .optional()?;

        let Some(current) = current else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let NodeRow {
            kind,
            doc_markdown,
            doc_hash,
            doc_synced_at_ms,
            created_at_ms,
            label: current_label,
            summary: current_summary,
            color: current_color,
            parent_id: current_parent_id,
            doc_path: current_doc_path,
            sort_order: current_sort_order,
            ..
        } = current;

        let label = patch.label.unwrap_or(current_label);
        let summary = patch.summary.unwrap_or(current_summary);
        let color = patch.color.unwrap_or(current_color);
        let parent_id = patch.parent_id.unwrap_or(current_parent_id);
        let doc_path = patch.doc_path.unwrap_or(current_doc_path);
        let sort_order = patch.sort_order.unwrap_or(current_sort_order);

        if label.trim().is_empty() {
            return Err(StoreError::InvalidInput("label must not be empty"));
        }
        if parent_id.as_deref() == Some(id) {
            return Err(StoreError::InvalidInput("node cannot be its own parent"));
        }

        tx.execute(
            r#"
            UPDATE knowledge_nodes
            SET label = ?2, summary = ?3, color = ?4, parent_id = ?5, doc_path = ?6,
                sort_order = ?7, updated_at_ms = ?8
            WHERE id = ?1 AND is_trashed = 0
            "#,
            params![id, label, summary, color, parent_id, doc_path, sort_order, now_ms],
        )?;

        tx.commit()?;
        Ok(NodeRow {
            id: id.to_string(),
            label,
            kind,
            summary,
            color,
            parent_id,
            doc_path,
            doc_markdown,
            doc_hash,
            doc_synced_at_ms,
            sort_order,
            is_trashed: false,
            trashed_at_ms: None,
            trashed_parent_id: None,
            trash_tx_id: None,
            created_at_ms,
            updated_at_ms: now_ms,
        })
    }

    /// Fetches a row regardless of trash state.
    pub fn get_node(&self, id: &str) -> Result<Option<NodeRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM knowledge_nodes WHERE id = ?1"),
                params![id],
                node_from_row,
            )
            .optional()?)
    }
}
