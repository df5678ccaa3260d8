#![forbid(unsafe_code)]

use super::SyncEngine;
use crate::content::template_markdown;
use crate::error::EngineError;
use kn_core::ids::NodeId;
use kn_core::model::NodeKind;
use kn_storage::{NewNodeRequest, NodeRow};

#[derive(Clone, Debug, PartialEq)]
pub struct CreateNodeRequest {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub parent_id: Option<String>,
    pub summary: Option<String>,
    pub color: Option<String>,
    pub doc_path: Option<String>,
    pub sort_order: i64,
    pub skip_document: bool,
}

impl SyncEngine {
    /// Creates a node and, for leaves, its scaffold document. The row insert
    /// is the commit point: the document is written first, and removed again
    /// if the insert then fails, so a failure never leaves an orphan on
    /// either side.
    pub fn create_node(&mut self, request: CreateNodeRequest) -> Result<NodeRow, EngineError> {
        self.oplog.note_op(&format!("create {}", request.id));
        let result = self.create_node_inner(request);
        if let Err(err) = &result {
            self.oplog.note_error(&err.to_string());
        }
        result
    }

    fn create_node_inner(&mut self, request: CreateNodeRequest) -> Result<NodeRow, EngineError> {
        let id = NodeId::try_new(request.id.as_str())
            .map_err(|_| EngineError::InvalidInput("invalid node id"))?;

        if request.kind == NodeKind::Folder && request.doc_path.is_some() {
            return Err(EngineError::InvalidInput(
                "folder nodes cannot carry a doc_path",
            ));
        }
        if request.label.trim().is_empty() {
            return Err(EngineError::InvalidInput("label must not be empty"));
        }

        if let Some(parent_id) = request.parent_id.as_deref() {
            let parent = self.store.get_node(parent_id)?;
            if !parent.is_some_and(|row| !row.is_trashed) {
                return Err(EngineError::ParentNotFound(parent_id.to_string()));
            }
        }

        let doc_path = match request.kind {
            NodeKind::Folder => None,
            NodeKind::Leaf => Some(match request.doc_path {
                Some(explicit) => {
                    // Sandbox check up front so a bad path fails before any
                    // row or file exists.
                    self.content.root().resolve(&explicit)?;
                    explicit
                }
                None => {
                    let root_id = match request.parent_id.as_deref() {
                        Some(parent_id) => self
                            .store
                            .resolve_root_id(parent_id)?
                            .unwrap_or_else(|| id.as_str().to_string()),
                        None => id.as_str().to_string(),
                    };
                    format!("{root_id}/{}.md", id.as_str())
                }
            }),
        };

        let write_document = request.kind == NodeKind::Leaf && !request.skip_document;
        let mut written_doc: Option<String> = None;

        if write_document {
            let doc_path = doc_path.as_deref().unwrap_or_default();
            if self.content.document_exists(doc_path)? {
                return Err(EngineError::DocumentExists(doc_path.to_string()));
            }
            let body = template_markdown(&request.label, request.summary.as_deref());
            self.content.write_document(doc_path, &body)?;
            written_doc = Some(doc_path.to_string());
        }

        let inserted = self.store.insert_node(NewNodeRequest {
            id: id.into_string(),
            label: request.label,
            kind: request.kind,
            summary: request.summary,
            color: request.color,
            parent_id: request.parent_id,
            doc_path,
            sort_order: request.sort_order,
        });

        match inserted {
            Ok(row) => Ok(row),
            Err(err) => {
                if let Some(doc_path) = written_doc {
                    if let Err(cleanup_err) = self.content.remove_document(&doc_path) {
                        self.oplog.note_compensation_failure(
                            &format!("remove document {doc_path}"),
                            &cleanup_err.to_string(),
                        );
                    }
                }
                Err(err.into())
            }
        }
    }
}
