#![forbid(unsafe_code)]

use crate::content::derive_summary;
use crate::error::EngineError;
use crate::lifecycle::SyncEngine;
use kn_storage::NodeRow;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

const SNAPSHOT_SOURCE: &str = "sqlite-markdown-sync";

/// Denormalized, nested projection of the live catalog, consumed read-only
/// by the presentation layer.
#[derive(Clone, Debug, Serialize)]
pub struct ReadModel {
    pub meta: SnapshotMeta,
    pub tree: Vec<SnapshotNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SnapshotMeta {
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub source: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SnapshotNode {
    pub id: String,
    pub label: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "docPath", skip_serializing_if = "Option::is_none")]
    pub doc_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

#[derive(Clone, Debug, Default)]
pub struct SnapshotReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub warnings: Vec<String>,
}

impl SyncEngine {
    /// Builds the read model from the live structural rows plus per-leaf
    /// content. Tree invariant violations abort the build: a bad tree is
    /// never published.
    pub fn build_read_model(&mut self) -> Result<(ReadModel, SnapshotReport), EngineError> {
        let rows = self.store.list_nodes(false)?;
        if rows.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        let edges = self.store.list_dependencies()?;

        let by_id: HashMap<&str, &NodeRow> =
            rows.iter().map(|row| (row.id.as_str(), row)).collect();

        for row in &rows {
            if let Some(parent_id) = row.parent_id.as_deref() {
                if !by_id.contains_key(parent_id) {
                    return Err(EngineError::DanglingParent {
                        id: row.id.clone(),
                        parent: parent_id.to_string(),
                    });
                }
            }
        }

        // Children index in listing order; rows is already parent/sort/id
        // ordered so sibling order is stable.
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for row in &rows {
            children.entry(row.id.as_str()).or_default();
        }
        for row in &rows {
            if let Some(parent_id) = row.parent_id.as_deref() {
                children.entry(parent_id).or_default().push(row.id.as_str());
            }
        }

        detect_cycles(&rows, &children)?;

        let mut deps_by_source: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for edge in &edges {
            deps_by_source
                .entry(edge.source_id.as_str())
                .or_default()
                .push(edge.target_id.clone());
        }

        let mut report = SnapshotReport {
            node_count: rows.len(),
            edge_count: edges.len(),
            warnings: Vec::new(),
        };

        // Disk fallback for leaves whose cached body never made it through a
        // resync: the file on disk wins over an empty cache.
        let mut fallback: HashMap<&str, String> = HashMap::new();
        for row in &rows {
            let is_leaf = children.get(row.id.as_str()).is_none_or(Vec::is_empty);
            let Some(doc_path) = row.doc_path.as_deref() else {
                continue;
            };
            if !is_leaf || row.doc_markdown.as_deref().is_some_and(|m| !m.is_empty()) {
                continue;
            }
            match self.content.read_document(doc_path) {
                Ok(markdown) => {
                    fallback.insert(row.id.as_str(), markdown);
                }
                Err(err) => {
                    report
                        .warnings
                        .push(format!("read document failed ({} -> {doc_path}): {err}", row.id));
                }
            }
        }

        let roots: Vec<&str> = rows
            .iter()
            .filter(|row| row.parent_id.is_none())
            .map(|row| row.id.as_str())
            .collect();

        let tree = roots
            .iter()
            .map(|root| materialize(root, None, &by_id, &children, &deps_by_source, &fallback))
            .collect();

        let model = ReadModel {
            meta: SnapshotMeta {
                generated_at: crate::time::now_rfc3339(),
                source: SNAPSHOT_SOURCE.to_string(),
            },
            tree,
        };
        Ok((model, report))
    }

    /// Builds the read model and replaces the snapshot file atomically
    /// (whole-file temp write + rename).
    pub fn write_snapshot(&mut self, out_path: &Path) -> Result<SnapshotReport, EngineError> {
        let (model, report) = self.build_read_model()?;

        let mut payload = serde_json::to_string_pretty(&model)
            .map_err(|_| EngineError::InvalidInput("read model is not serializable"))?;
        payload.push('\n');

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = out_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)?;
        std::fs::rename(&tmp_path, out_path)?;

        Ok(report)
    }
}

/// Depth-first walk over every node with an explicit stack; a node seen
/// while still on the current path is a cycle. This is the safety net for
/// invariant violations introduced by manual data edits.
fn detect_cycles(
    rows: &[NodeRow],
    children: &HashMap<&str, Vec<&str>>,
) -> Result<(), EngineError> {
    let mut visited: HashSet<&str> = HashSet::new();

    for row in rows {
        if visited.contains(row.id.as_str()) {
            continue;
        }

        let mut on_path: HashSet<&str> = HashSet::new();
        // (id, entered) pairs: the second visit pops the id off the path.
        let mut stack: Vec<(&str, bool)> = vec![(row.id.as_str(), false)];

        while let Some((id, entered)) = stack.pop() {
            if entered {
                on_path.remove(id);
                continue;
            }
            if on_path.contains(id) {
                return Err(EngineError::CycleDetected(id.to_string()));
            }
            if visited.contains(id) {
                continue;
            }
            visited.insert(id);
            on_path.insert(id);
            stack.push((id, true));
            if let Some(child_ids) = children.get(id) {
                for child_id in child_ids {
                    if on_path.contains(child_id) {
                        return Err(EngineError::CycleDetected(child_id.to_string()));
                    }
                    stack.push((child_id, false));
                }
            }
        }
    }
    Ok(())
}

fn materialize(
    id: &str,
    inherited_color: Option<&str>,
    by_id: &HashMap<&str, &NodeRow>,
    children: &HashMap<&str, Vec<&str>>,
    deps_by_source: &BTreeMap<&str, Vec<String>>,
    fallback: &HashMap<&str, String>,
) -> SnapshotNode {
    let row = by_id[id];
    let child_ids = children.get(id).map(Vec::as_slice).unwrap_or_default();
    let color = row.color.as_deref().or(inherited_color);

    // Folder when the node groups children or has no document slot;
    // otherwise a leaf, even if its document was never written.
    let kind = if !child_ids.is_empty() || row.doc_path.is_none() {
        "folder"
    } else {
        "leaf"
    };

    let content = row
        .doc_markdown
        .as_deref()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| fallback.get(id).cloned());
    let description = row
        .summary
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            content
                .as_deref()
                .map(derive_summary)
                .filter(|s| !s.is_empty())
        });

    SnapshotNode {
        id: row.id.clone(),
        label: row.label.clone(),
        kind,
        description,
        color: color.map(str::to_string),
        doc_path: row.doc_path.clone(),
        content,
        dependencies: deps_by_source.get(id).cloned().unwrap_or_default(),
        children: child_ids
            .iter()
            .map(|child_id| {
                materialize(child_id, color, by_id, children, deps_by_source, fallback)
            })
            .collect(),
    }
}
