#![forbid(unsafe_code)]

use crate::error::EngineError;
use std::path::{Component, Path, PathBuf};

/// Confines every document path to the configured root. This is the only
/// defense against a malicious or malformed `doc_path`, so all filesystem
/// access in the engine resolves through it.
#[derive(Clone, Debug)]
pub struct DocRoot {
    root: PathBuf,
}

impl DocRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a caller-supplied relative path to an absolute path strictly
    /// under the root. Backslashes are normalized to forward slashes first;
    /// absolute paths, drive prefixes and `..` segments that would leave the
    /// root are rejected with `PathEscape`.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, EngineError> {
        let normalized = relative.replace('\\', "/");
        if normalized.trim().is_empty() {
            return Err(EngineError::PathEscape(relative.to_string()));
        }

        let candidate = Path::new(&normalized);
        let mut clean = PathBuf::new();
        let mut depth = 0usize;

        for component in candidate.components() {
            match component {
                Component::Normal(part) => {
                    clean.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(EngineError::PathEscape(relative.to_string()));
                    }
                    clean.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(EngineError::PathEscape(relative.to_string()));
                }
            }
        }

        if depth == 0 {
            // "." and friends resolve to the root itself, not a descendant.
            return Err(EngineError::PathEscape(relative.to_string()));
        }

        Ok(self.root.join(clean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> DocRoot {
        DocRoot::new("/srv/docs")
    }

    #[test]
    fn resolves_plain_relative_paths() {
        let resolved = root().resolve("F1/N1.md").expect("resolve");
        assert_eq!(resolved, PathBuf::from("/srv/docs/F1/N1.md"));
    }

    #[test]
    fn normalizes_backslashes_and_cur_dirs() {
        let resolved = root().resolve("a\\b/./c.md").expect("resolve");
        assert_eq!(resolved, PathBuf::from("/srv/docs/a/b/c.md"));
    }

    #[test]
    fn allows_internal_parent_segments() {
        let resolved = root().resolve("a/../b.md").expect("resolve");
        assert_eq!(resolved, PathBuf::from("/srv/docs/b.md"));
    }

    #[test]
    fn rejects_escaping_paths() {
        for bad in ["..", "../x.md", "a/../../b.md", "/etc/passwd", "", ".", "./"] {
            let err = root().resolve(bad).expect_err("must reject");
            assert!(
                matches!(err, EngineError::PathEscape(_)),
                "expected PathEscape for {bad:?}, got {err:?}"
            );
        }
    }
}
