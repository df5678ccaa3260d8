#![forbid(unsafe_code)]

mod content;
mod error;
mod lifecycle;
mod oplog;
mod resync;
mod sandbox;
mod snapshot;
mod time;

pub use content::{ContentStore, derive_summary, hash_markdown, template_markdown};
pub use error::EngineError;
pub use lifecycle::{
    CreateNodeRequest, RestoreReceipt, SyncEngine, TrashReceipt, UpdateNodeRequest,
};
pub use oplog::OpLog;
pub use resync::ResyncReport;
pub use sandbox::DocRoot;
pub use snapshot::{ReadModel, SnapshotMeta, SnapshotNode, SnapshotReport};
