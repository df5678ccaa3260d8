#![forbid(unsafe_code)]

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyRow {
    pub source_id: String,
    pub target_id: String,
    pub kind: String,
}
