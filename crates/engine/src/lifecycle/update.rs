#![forbid(unsafe_code)]

use super::SyncEngine;
use crate::error::EngineError;
use kn_core::model::NodeKind;
use kn_storage::{NodePatch, NodeRow};

/// Field-level patch semantics: only supplied fields are touched; an inner
/// `None` clears the column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateNodeRequest {
    pub id: String,
    pub label: Option<String>,
    pub summary: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub parent_id: Option<Option<String>>,
    pub doc_path: Option<Option<String>>,
    pub sort_order: Option<i64>,
}

impl SyncEngine {
    /// Updates a live node. A `doc_path` change moves the document before
    /// the row update commits; if the row update then fails the document is
    /// moved back.
    pub fn update_node(&mut self, request: UpdateNodeRequest) -> Result<NodeRow, EngineError> {
        self.oplog.note_op(&format!("update {}", request.id));
        let result = self.update_node_inner(request);
        if let Err(err) = &result {
            self.oplog.note_error(&err.to_string());
        }
        result
    }

    fn update_node_inner(&mut self, request: UpdateNodeRequest) -> Result<NodeRow, EngineError> {
        let current = self.require_live(&request.id)?;

        if current.kind == NodeKind::Folder && matches!(request.doc_path, Some(Some(_))) {
            return Err(EngineError::InvalidInput(
                "folder nodes cannot carry a doc_path",
            ));
        }

        if let Some(Some(parent_id)) = request.parent_id.as_ref() {
            if parent_id == &request.id {
                return Err(EngineError::InvalidInput("node cannot be its own parent"));
            }
            let parent = self.store.get_node(parent_id)?;
            if !parent.is_some_and(|row| !row.is_trashed) {
                return Err(EngineError::ParentNotFound(parent_id.clone()));
            }
        }

        // Validate any new doc path before touching disk or row.
        if let Some(Some(new_doc_path)) = request.doc_path.as_ref() {
            self.content.root().resolve(new_doc_path)?;
        }

        let mut moved: Option<(String, String)> = None;
        if let (Some(Some(new_doc_path)), Some(old_doc_path)) =
            (request.doc_path.as_ref(), current.doc_path.as_deref())
        {
            if new_doc_path != old_doc_path && self.content.document_exists(old_doc_path)? {
                self.content.move_document(old_doc_path, new_doc_path)?;
                moved = Some((old_doc_path.to_string(), new_doc_path.clone()));
            }
        }

        let patch = NodePatch {
            label: request.label,
            summary: request.summary,
            color: request.color,
            parent_id: request.parent_id,
            doc_path: request.doc_path,
            sort_order: request.sort_order,
        };

        match self.store.update_node(&request.id, patch) {
            Ok(row) => Ok(row),
            Err(err) => {
                if let Some((old_doc_path, new_doc_path)) = moved {
                    if let Err(move_back_err) =
                        self.content.move_document(&new_doc_path, &old_doc_path)
                    {
                        self.oplog.note_compensation_failure(
                            &format!("move document back to {old_doc_path}"),
                            &move_back_err.to_string(),
                        );
                    }
                }
                Err(err.into())
            }
        }
    }
}
