#![forbid(unsafe_code)]

use super::{SyncEngine, new_trash_tx_id, trash_doc_path};
use crate::error::EngineError;

#[derive(Clone, Debug)]
pub struct TrashReceipt {
    pub trash_tx_id: String,
    pub nodes_trashed: usize,
    pub docs_archived: usize,
}

impl SyncEngine {
    /// Soft-deletes a node and its whole live subtree as one trash
    /// generation. Documents are moved into the generation's namespace
    /// before the single-statement structural flip; if the flip fails every
    /// moved document is moved back.
    pub fn trash_node(&mut self, id: &str) -> Result<TrashReceipt, EngineError> {
        self.oplog.note_op(&format!("trash {id}"));
        let result = self.trash_node_inner(id);
        if let Err(err) = &result {
            self.oplog.note_error(&err.to_string());
        }
        result
    }

    fn trash_node_inner(&mut self, id: &str) -> Result<TrashReceipt, EngineError> {
        self.require_live(id)?;

        let trash_tx_id = new_trash_tx_id();
        let now_ms = crate::time::now_ms_i64();

        let docs = self.store.fetch_live_subtree_docs(id)?;
        let mut moved: Vec<(String, String)> = Vec::new();

        for doc in &docs {
            // Not every node has a document on disk; absentees are skipped.
            if !self.content.document_exists(&doc.doc_path)? {
                continue;
            }
            let archived = trash_doc_path(&trash_tx_id, &doc.doc_path);
            if let Err(err) = self.content.move_document(&doc.doc_path, &archived) {
                self.unwind_archive(&moved);
                return Err(err);
            }
            moved.push((doc.doc_path.clone(), archived));
        }

        let nodes_trashed = match self.store.mark_subtree_trashed(id, &trash_tx_id, now_ms) {
            Ok(count) => count,
            Err(err) => {
                self.unwind_archive(&moved);
                return Err(err.into());
            }
        };

        Ok(TrashReceipt {
            trash_tx_id,
            nodes_trashed,
            docs_archived: moved.len(),
        })
    }

    /// Reverse of the archive moves, newest first. Best-effort: failures are
    /// logged and never mask the error that triggered the unwind.
    fn unwind_archive(&mut self, moved: &[(String, String)]) {
        for (original, archived) in moved.iter().rev() {
            if let Err(err) = self.content.move_document(archived, original) {
                self.oplog.note_compensation_failure(
                    &format!("move document back to {original}"),
                    &err.to_string(),
                );
            }
        }
    }
}
