#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

/// Best-effort record of the most recent operation, kept next to the
/// database. Compensation failures during rollback land here (and on
/// stderr) instead of masking the original error.
#[derive(Clone, Debug)]
pub struct OpLog {
    path: PathBuf,
    start_rfc3339: String,
    pid: u32,
    op: Option<String>,
    last_error: Option<String>,
    compensation_failures: Vec<String>,
}

impl OpLog {
    pub fn new(storage_dir: &Path) -> Self {
        let this = Self {
            path: storage_dir.join("knowledge_last_op.txt"),
            start_rfc3339: crate::time::now_rfc3339(),
            pid: std::process::id(),
            op: None,
            last_error: None,
            compensation_failures: Vec::new(),
        };
        this.flush();
        this
    }

    pub fn note_op(&mut self, op: &str) {
        self.op = Some(truncate(op.trim(), 160));
        self.flush();
    }

    pub fn note_error(&mut self, error: &str) {
        let error = error.trim();
        if error.is_empty() {
            return;
        }
        self.last_error = Some(truncate(error, 300));
        self.flush();
    }

    /// Records a failed compensating action. These run during already-failing
    /// cleanup, so they are reported but never escalated.
    pub fn note_compensation_failure(&mut self, context: &str, error: &str) {
        let line = format!("{context}: {error}");
        eprintln!("compensation failed ({line})");
        self.compensation_failures.push(truncate(&line, 300));
        self.flush();
    }

    fn flush(&self) {
        let Some(dir) = self.path.parent() else {
            return;
        };
        let _ = std::fs::create_dir_all(dir);

        let mut out = String::new();
        push_kv(&mut out, "ts_start", &self.start_rfc3339);
        push_kv(&mut out, "pid", &self.pid.to_string());
        if let Some(op) = &self.op {
            push_kv(&mut out, "op", op);
        }
        if let Some(err) = &self.last_error {
            push_kv(&mut out, "last_error", err);
        }
        for failure in &self.compensation_failures {
            push_kv(&mut out, "compensation_failure", failure);
        }

        let _ = std::fs::write(&self.path, out);
    }
}

fn push_kv(out: &mut String, key: &str, value: &str) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "{key}={value}");
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in value.chars().enumerate() {
        if idx >= max_chars {
            break;
        }
        out.push(ch);
    }
    out
}
