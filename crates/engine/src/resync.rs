#![forbid(unsafe_code)]

use crate::content::{derive_summary, hash_markdown};
use crate::error::EngineError;
use crate::lifecycle::SyncEngine;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResyncReport {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub missing: usize,
}

impl SyncEngine {
    /// Pulls on-disk document edits back into the structural cache. The
    /// stored hash guards the write: unchanged files touch zero rows.
    /// Missing files are counted, not fatal; the node keeps its stale cache
    /// until the file reappears.
    pub fn resync_documents(&mut self) -> Result<ResyncReport, EngineError> {
        self.oplog.note_op("resync");

        let mut report = ResyncReport::default();
        let rows = self.store.list_document_nodes()?;
        report.total = rows.len();

        for row in rows {
            let markdown = match self.content.read_document(&row.doc_path) {
                Ok(markdown) => markdown,
                Err(EngineError::DocumentMissing(_)) => {
                    report.missing += 1;
                    continue;
                }
                Err(err) => {
                    self.oplog.note_error(&err.to_string());
                    return Err(err);
                }
            };

            let next_hash = hash_markdown(&markdown);
            if row.doc_hash.as_deref() == Some(next_hash.as_str()) {
                report.skipped += 1;
                continue;
            }

            let summary = derive_summary(&markdown);
            let summary = (!summary.is_empty()).then_some(summary);
            self.store.update_doc_cache(
                &row.id,
                summary.as_deref(),
                &markdown,
                &next_hash,
                crate::time::now_ms_i64(),
            )?;
            report.updated += 1;
        }

        Ok(report)
    }
}
