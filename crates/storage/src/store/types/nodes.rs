#![forbid(unsafe_code)]

use kn_core::model::NodeKind;

/// Full structural row, trash bookkeeping included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRow {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub summary: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub doc_path: Option<String>,
    pub doc_markdown: Option<String>,
    pub doc_hash: Option<String>,
    pub doc_synced_at_ms: Option<i64>,
    pub sort_order: i64,
    pub is_trashed: bool,
    pub trashed_at_ms: Option<i64>,
    pub trashed_parent_id: Option<String>,
    pub trash_tx_id: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct NewNodeRequest {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub summary: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub doc_path: Option<String>,
    pub sort_order: i64,
}

/// Field-level patch. An outer `None` leaves the column untouched; for
/// clearable columns an inner `None` writes NULL.
#[derive(Clone, Debug, Default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub summary: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub parent_id: Option<Option<String>>,
    pub doc_path: Option<Option<String>>,
    pub sort_order: Option<i64>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.summary.is_none()
            && self.color.is_none()
            && self.parent_id.is_none()
            && self.doc_path.is_none()
            && self.sort_order.is_none()
    }
}

/// A node that carries a document, paired with its relative path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocRef {
    pub id: String,
    pub doc_path: String,
}

/// Projection used by the hash-guarded content resync.
#[derive(Clone, Debug)]
pub struct DocSyncRow {
    pub id: String,
    pub doc_path: String,
    pub doc_hash: Option<String>,
}
