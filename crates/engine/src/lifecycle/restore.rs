#![forbid(unsafe_code)]

use super::{SyncEngine, trash_doc_path};
use crate::error::EngineError;
use kn_storage::StoreError;

#[derive(Clone, Debug)]
pub struct RestoreReceipt {
    pub trash_tx_id: String,
    pub nodes_restored: usize,
    pub docs_restored: usize,
}

impl SyncEngine {
    /// Reverses exactly one trash generation: the node and every descendant
    /// that was co-trashed with it. Blocked while the node's parent is still
    /// trashed, so a restore never produces a subtree with no visible root.
    pub fn restore_node(&mut self, id: &str) -> Result<RestoreReceipt, EngineError> {
        self.oplog.note_op(&format!("restore {id}"));
        let result = self.restore_node_inner(id);
        if let Err(err) = &result {
            self.oplog.note_error(&err.to_string());
        }
        result
    }

    fn restore_node_inner(&mut self, id: &str) -> Result<RestoreReceipt, EngineError> {
        let Some(current) = self.store.get_node(id)? else {
            return Err(EngineError::Store(StoreError::NotFound(id.to_string())));
        };
        if !current.is_trashed {
            return Err(EngineError::NotTrashed(id.to_string()));
        }
        let Some(trash_tx_id) = current.trash_tx_id else {
            return Err(EngineError::InvalidInput(
                "trashed node has no trash_tx_id",
            ));
        };

        if let Some(parent_id) = current.parent_id.as_deref() {
            match self.store.get_node(parent_id)? {
                None => return Err(EngineError::ParentNotFound(parent_id.to_string())),
                Some(parent) if parent.is_trashed => {
                    return Err(EngineError::ParentStillTrashed {
                        id: id.to_string(),
                        parent: parent_id.to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        let now_ms = crate::time::now_ms_i64();
        let docs = self.store.fetch_generation_docs(id, &trash_tx_id)?;
        let mut moved: Vec<(String, String)> = Vec::new();

        for doc in &docs {
            let archived = trash_doc_path(&trash_tx_id, &doc.doc_path);
            // A node may have had no document when it was trashed.
            if !self.content.document_exists(&archived)? {
                continue;
            }
            if let Err(err) = self.content.move_document(&archived, &doc.doc_path) {
                self.rewind_restore(&moved);
                return Err(err);
            }
            moved.push((doc.doc_path.clone(), archived));
        }

        let nodes_restored = match self.store.mark_subtree_restored(id, &trash_tx_id, now_ms) {
            Ok(count) => count,
            Err(err) => {
                self.rewind_restore(&moved);
                return Err(err.into());
            }
        };

        Ok(RestoreReceipt {
            trash_tx_id,
            nodes_restored,
            docs_restored: moved.len(),
        })
    }

    /// Puts already-restored documents back into the trash namespace after a
    /// failed structural flip. Best-effort, logged.
    fn rewind_restore(&mut self, moved: &[(String, String)]) {
        for (original, archived) in moved.iter().rev() {
            if let Err(err) = self.content.move_document(original, archived) {
                self.oplog.note_compensation_failure(
                    &format!("re-archive document {original}"),
                    &err.to_string(),
                );
            }
        }
    }
}
