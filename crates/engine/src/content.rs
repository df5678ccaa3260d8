#![forbid(unsafe_code)]

use crate::error::EngineError;
use crate::sandbox::DocRoot;
use sha2::{Digest, Sha256};

/// Markdown document store under the sandboxed root. Paths are the relative
/// `doc_path` values recorded on structural rows.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: DocRoot,
}

impl ContentStore {
    pub fn new(root: DocRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &DocRoot {
        &self.root
    }

    pub fn document_exists(&self, doc_path: &str) -> Result<bool, EngineError> {
        let absolute = self.root.resolve(doc_path)?;
        Ok(absolute.is_file())
    }

    pub fn read_document(&self, doc_path: &str) -> Result<String, EngineError> {
        let absolute = self.root.resolve(doc_path)?;
        match std::fs::read_to_string(&absolute) {
            Ok(markdown) => Ok(markdown),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::DocumentMissing(doc_path.to_string()))
            }
            Err(err) => Err(EngineError::Io(err)),
        }
    }

    /// Creates parent directories as needed; overwrites an existing file.
    pub fn write_document(&self, doc_path: &str, markdown: &str) -> Result<(), EngineError> {
        let absolute = self.root.resolve(doc_path)?;
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&absolute, markdown)?;
        Ok(())
    }

    /// Directory-safe rename. A missing source surfaces as `DocumentMissing`;
    /// callers that tolerate nodes without documents treat that as a no-op.
    pub fn move_document(&self, from_path: &str, to_path: &str) -> Result<(), EngineError> {
        let from = self.root.resolve(from_path)?;
        let to = self.root.resolve(to_path)?;
        if !from.is_file() {
            return Err(EngineError::DocumentMissing(from_path.to_string()));
        }
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&from, &to)?;
        Ok(())
    }

    pub fn remove_document(&self, doc_path: &str) -> Result<(), EngineError> {
        let absolute = self.root.resolve(doc_path)?;
        match std::fs::remove_file(&absolute) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::DocumentMissing(doc_path.to_string()))
            }
            Err(err) => Err(EngineError::Io(err)),
        }
    }
}

/// Stable content fingerprint used for idempotent resync.
pub fn hash_markdown(markdown: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(markdown.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// First non-empty, non-heading line of the document; empty when none.
pub fn derive_summary(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .unwrap_or_default()
        .to_string()
}

/// Scaffold body written when a leaf is created without `skip_document`.
pub fn template_markdown(title: &str, summary: Option<&str>) -> String {
    let summary = match summary {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => "To be written.",
    };
    format!(
        "# {title}\n\n## Summary\n\n{summary}\n\n## Details\n\n- Background: to be written\n- Key steps: to be written\n- Risks and boundaries: to be written\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_skips_headings_and_blanks() {
        let markdown = "# Title\n\n## Section\n\n  first real line  \nsecond line\n";
        assert_eq!(derive_summary(markdown), "first real line");
    }

    #[test]
    fn summary_is_empty_for_heading_only_docs() {
        assert_eq!(derive_summary("# Title\n\n## Section\n"), "");
        assert_eq!(derive_summary(""), "");
    }

    #[test]
    fn template_uses_summary_when_present() {
        let body = template_markdown("Intro", Some("short pitch"));
        assert!(body.starts_with("# Intro\n"));
        assert!(body.contains("short pitch"));
        assert_eq!(derive_summary(&body), "short pitch");
    }

    #[test]
    fn template_falls_back_to_placeholder() {
        let body = template_markdown("Intro", None);
        assert_eq!(derive_summary(&body), "To be written.");
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        assert_eq!(hash_markdown("abc"), hash_markdown("abc"));
        assert_ne!(hash_markdown("abc"), hash_markdown("abd"));
        assert_eq!(hash_markdown("abc").len(), 64);
    }
}
