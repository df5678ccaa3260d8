#![forbid(unsafe_code)]

mod create;
mod restore;
mod trash;
mod update;

pub use create::CreateNodeRequest;
pub use restore::RestoreReceipt;
pub use trash::TrashReceipt;
pub use update::UpdateNodeRequest;

use crate::content::ContentStore;
use crate::error::EngineError;
use crate::oplog::OpLog;
use crate::sandbox::DocRoot;
use kn_storage::SqliteStore;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Namespace under the document root where trashed documents wait for
/// restore, keyed by trash transaction id.
pub(crate) const TRASH_DIR: &str = "_trash";

/// Coordinates the structural store and the content store. One lifecycle
/// operation runs to completion before the next is accepted; every
/// filesystem side effect performed before a later failure is compensated
/// by an explicit reverse operation.
#[derive(Debug)]
pub struct SyncEngine {
    pub(crate) store: SqliteStore,
    pub(crate) content: ContentStore,
    pub(crate) oplog: OpLog,
}

impl SyncEngine {
    pub fn open(
        storage_dir: impl AsRef<Path>,
        docs_root: impl AsRef<Path>,
    ) -> Result<Self, EngineError> {
        let store = SqliteStore::open(storage_dir.as_ref())?;
        let content = ContentStore::new(DocRoot::new(docs_root.as_ref()));
        let oplog = OpLog::new(store.storage_dir());
        Ok(Self {
            store,
            content,
            oplog,
        })
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Requires `id` to name a live node; trashed and unknown nodes fail
    /// with the respective precondition error.
    pub(crate) fn require_live(&self, id: &str) -> Result<kn_storage::NodeRow, EngineError> {
        let Some(row) = self.store.get_node(id)? else {
            return Err(EngineError::Store(kn_storage::StoreError::NotFound(
                id.to_string(),
            )));
        };
        if row.is_trashed {
            return Err(EngineError::NodeTrashed(id.to_string()));
        }
        Ok(row)
    }
}

/// Time-based, collision-resistant id grouping one trash cascade. The
/// timestamp keeps generations sortable on disk; the suffix disambiguates
/// cascades within the same millisecond.
pub(crate) fn new_trash_tx_id() -> String {
    let stamp = crate::time::now_rfc3339().replace([':', '.'], "-");
    let mut hasher = Sha256::new();
    hasher.update(crate::time::now_nanos_i128().to_be_bytes());
    hasher.update(std::process::id().to_be_bytes());
    let digest = hasher.finalize();
    let mut suffix = String::with_capacity(6);
    for byte in digest.iter().take(3) {
        use std::fmt::Write as _;
        let _ = write!(suffix, "{byte:02x}");
    }
    format!("{stamp}-{suffix}")
}

/// Location of a document inside a trash generation: the original relative
/// path is preserved under the generation's namespace so restore is exact
/// and independent generations never collide.
pub(crate) fn trash_doc_path(trash_tx_id: &str, doc_path: &str) -> String {
    format!("{TRASH_DIR}/{trash_tx_id}/{doc_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trash_tx_ids_are_distinct_and_path_safe() {
        let a = new_trash_tx_id();
        let b = new_trash_tx_id();
        assert_ne!(a, b);
        assert!(!a.contains(':'));
        assert!(!a.contains('.'));
        assert!(!a.contains('/'));
    }

    #[test]
    fn trash_doc_path_preserves_relative_layout() {
        assert_eq!(
            trash_doc_path("tx-1", "F1/N1.md"),
            "_trash/tx-1/F1/N1.md"
        );
    }
}
