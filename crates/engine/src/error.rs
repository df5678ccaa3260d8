#![forbid(unsafe_code)]

use kn_storage::StoreError;

#[derive(Debug)]
pub enum EngineError {
    Io(std::io::Error),
    Store(StoreError),
    InvalidInput(&'static str),
    /// Security boundary violation. Always fatal, never retried.
    PathEscape(String),
    DocumentExists(String),
    DocumentMissing(String),
    ParentNotFound(String),
    ParentStillTrashed {
        id: String,
        parent: String,
    },
    NodeTrashed(String),
    NotTrashed(String),
    /// Data-integrity errors raised only by the snapshot builder.
    DanglingParent {
        id: String,
        parent: String,
    },
    CycleDetected(String),
    EmptyCatalog,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::PathEscape(path) => {
                write!(f, "doc path escapes the document root: {path}")
            }
            Self::DocumentExists(path) => write!(f, "document already exists: {path}"),
            Self::DocumentMissing(path) => write!(f, "document missing: {path}"),
            Self::ParentNotFound(id) => write!(f, "parent node not found or trashed: {id}"),
            Self::ParentStillTrashed { id, parent } => write!(
                f,
                "cannot restore {id}: parent {parent} is still trashed (restore it first)"
            ),
            Self::NodeTrashed(id) => write!(f, "node is trashed: {id}"),
            Self::NotTrashed(id) => write!(f, "node is not trashed: {id}"),
            Self::DanglingParent { id, parent } => {
                write!(f, "node {id} references missing parent {parent}")
            }
            Self::CycleDetected(id) => write!(f, "parent cycle detected at node {id}"),
            Self::EmptyCatalog => write!(f, "no live nodes; refusing to publish an empty tree"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
