#![forbid(unsafe_code)]

use kn_core::model::{DEFAULT_DEPENDENCY_KIND, NodeKind};
use kn_engine::{CreateNodeRequest, EngineError, SyncEngine, UpdateNodeRequest};
use std::path::PathBuf;

fn usage() -> &'static str {
    "kn — knowledge catalog lifecycle and document sync\n\n\
USAGE:\n\
  kn [--storage-dir DIR] [--docs-root DIR] [--snapshot-out FILE] COMMAND\n\n\
COMMANDS:\n\
  create ID [--label TEXT] [--kind folder|leaf] [--parent-id ID]\n\
            [--summary TEXT] [--color HEX] [--doc-path PATH]\n\
            [--sort-order N] [--skip-document]\n\
  update ID [--label TEXT] [--summary TEXT] [--color HEX]\n\
            [--parent-id ID] [--doc-path PATH] [--sort-order N]\n\
            (empty --summary/--color/--doc-path clears the field;\n\
             empty --parent-id moves to root; --label must not be empty)\n\
  delete ID            move the node and its subtree to the trash\n\
  restore ID           bring one trash generation back\n\
  list [--include-trashed]\n\
  link SOURCE TARGET [--kind KIND]\n\
  resync               pull document edits back into the catalog\n\
  snapshot             rebuild the read-model file\n\n\
Defaults: --storage-dir .knowledge, --docs-root docs/knowledge,\n\
          --snapshot-out data/read-model.json. Every mutating command\n\
          refreshes the snapshot on success.\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug)]
struct CliConfig {
    storage_dir: PathBuf,
    docs_root: PathBuf,
    snapshot_out: PathBuf,
}

#[derive(Debug, PartialEq)]
enum Command {
    Create(CreateNodeRequest),
    Update(UpdateNodeRequest),
    Delete { id: String },
    Restore { id: String },
    List { include_trashed: bool },
    Link { source: String, target: String, kind: String },
    Resync,
    Snapshot,
}

impl Command {
    fn mutates(&self) -> bool {
        !matches!(self, Self::List { .. } | Self::Snapshot)
    }
}

fn parse_args(args: &[String]) -> Result<(CliConfig, Command), String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }

    let mut storage_dir: Option<PathBuf> = env_var("KN_STORAGE_DIR").map(PathBuf::from);
    let mut docs_root: Option<PathBuf> = env_var("KN_DOCS_ROOT").map(PathBuf::from);
    let mut snapshot_out: Option<PathBuf> = env_var("KN_SNAPSHOT_OUT").map(PathBuf::from);

    let mut command: Option<String> = None;
    let mut positionals: Vec<String> = Vec::new();

    let mut label: Option<String> = None;
    let mut kind: Option<String> = None;
    let mut parent_id: Option<String> = None;
    let mut summary: Option<String> = None;
    let mut color: Option<String> = None;
    let mut doc_path: Option<String> = None;
    let mut sort_order: Option<i64> = None;
    let mut skip_document = false;
    let mut include_trashed = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--docs-root" => {
                i += 1;
                let v = args.get(i).ok_or("--docs-root requires DIR")?;
                docs_root = Some(PathBuf::from(v));
            }
            "--snapshot-out" => {
                i += 1;
                let v = args.get(i).ok_or("--snapshot-out requires FILE")?;
                snapshot_out = Some(PathBuf::from(v));
            }
            "--label" => {
                i += 1;
                label = Some(args.get(i).ok_or("--label requires TEXT")?.to_string());
            }
            "--kind" => {
                i += 1;
                kind = Some(args.get(i).ok_or("--kind requires folder|leaf")?.to_string());
            }
            "--parent-id" => {
                i += 1;
                parent_id = Some(args.get(i).ok_or("--parent-id requires ID")?.to_string());
            }
            "--summary" => {
                i += 1;
                summary = Some(args.get(i).ok_or("--summary requires TEXT")?.to_string());
            }
            "--color" => {
                i += 1;
                color = Some(args.get(i).ok_or("--color requires HEX")?.to_string());
            }
            "--doc-path" => {
                i += 1;
                doc_path = Some(args.get(i).ok_or("--doc-path requires PATH")?.to_string());
            }
            "--sort-order" => {
                i += 1;
                let v = args.get(i).ok_or("--sort-order requires N")?;
                sort_order = Some(
                    v.parse::<i64>()
                        .map_err(|_| "--sort-order must be an integer")?,
                );
            }
            "--skip-document" => skip_document = true,
            "--include-trashed" => include_trashed = true,
            other if other.starts_with('-') => {
                return Err(format!("Unknown arg: {other}\n\n{}", usage()));
            }
            other => {
                if command.is_none() {
                    command = Some(other.to_string());
                } else {
                    positionals.push(other.to_string());
                }
            }
        }
        i += 1;
    }

    let config = CliConfig {
        storage_dir: storage_dir.unwrap_or_else(|| PathBuf::from(".knowledge")),
        docs_root: docs_root.unwrap_or_else(|| PathBuf::from("docs/knowledge")),
        snapshot_out: snapshot_out.unwrap_or_else(|| PathBuf::from("data/read-model.json")),
    };

    let Some(command) = command else {
        return Err(format!("Missing command\n\n{}", usage()));
    };

    let command = match command.as_str() {
        "create" => {
            let id = take_one(&mut positionals, "create requires ID")?;
            let kind = match kind.as_deref() {
                None => NodeKind::Leaf,
                Some(raw) => {
                    NodeKind::parse(raw).ok_or("--kind must be 'folder' or 'leaf'")?
                }
            };
            Command::Create(CreateNodeRequest {
                label: label.unwrap_or_else(|| id.clone()),
                id,
                kind,
                parent_id: parent_id.filter(|v| !v.is_empty()),
                summary: summary.filter(|v| !v.is_empty()),
                color: color.filter(|v| !v.is_empty()),
                doc_path: doc_path.filter(|v| !v.is_empty()),
                sort_order: sort_order.unwrap_or(0),
                skip_document,
            })
        }
        "update" => {
            let id = take_one(&mut positionals, "update requires ID")?;
            if label.as_deref() == Some("") {
                return Err("--label must not be empty".to_string());
            }
            Command::Update(UpdateNodeRequest {
                id,
                label,
                summary: summary.map(clear_when_empty),
                color: color.map(clear_when_empty),
                parent_id: parent_id.map(clear_when_empty),
                doc_path: doc_path.map(clear_when_empty),
                sort_order,
            })
        }
        "delete" => Command::Delete {
            id: take_one(&mut positionals, "delete requires ID")?,
        },
        "restore" => Command::Restore {
            id: take_one(&mut positionals, "restore requires ID")?,
        },
        "list" => Command::List { include_trashed },
        "link" => {
            let source = take_one(&mut positionals, "link requires SOURCE and TARGET")?;
            let target = take_one(&mut positionals, "link requires SOURCE and TARGET")?;
            Command::Link {
                source,
                target,
                kind: kind.unwrap_or_else(|| DEFAULT_DEPENDENCY_KIND.to_string()),
            }
        }
        "resync" => Command::Resync,
        "snapshot" => Command::Snapshot,
        other => return Err(format!("Unknown command: {other}\n\n{}", usage())),
    };

    if !positionals.is_empty() {
        return Err(format!("Unexpected argument: {}", positionals[0]));
    }

    Ok((config, command))
}

fn take_one(positionals: &mut Vec<String>, message: &str) -> Result<String, String> {
    if positionals.is_empty() {
        return Err(message.to_string());
    }
    Ok(positionals.remove(0))
}

/// Flag supplied with an empty value clears the column.
fn clear_when_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn run(config: &CliConfig, command: Command) -> Result<(), EngineError> {
    let mut engine = SyncEngine::open(&config.storage_dir, &config.docs_root)?;
    let refresh_snapshot = command.mutates();

    match command {
        Command::Create(request) => {
            let row = engine.create_node(request)?;
            match row.doc_path.as_deref() {
                Some(doc_path) => println!("created {} ({})", row.id, doc_path),
                None => println!("created {}", row.id),
            }
        }
        Command::Update(request) => {
            let row = engine.update_node(request)?;
            println!("updated {}", row.id);
        }
        Command::Delete { id } => {
            let receipt = engine.trash_node(&id)?;
            println!(
                "trashed {} node(s), archived {} document(s) [{}]",
                receipt.nodes_trashed, receipt.docs_archived, receipt.trash_tx_id
            );
        }
        Command::Restore { id } => {
            let receipt = engine.restore_node(&id)?;
            println!(
                "restored {} node(s), {} document(s) [{}]",
                receipt.nodes_restored, receipt.docs_restored, receipt.trash_tx_id
            );
        }
        Command::List { include_trashed } => {
            let rows = engine.store().list_nodes(include_trashed)?;
            for row in rows {
                let marker = if row.is_trashed { " [trashed]" } else { "" };
                let parent = row.parent_id.as_deref().unwrap_or("-");
                println!(
                    "{:<24} {:<6} parent={:<24} {}{marker}",
                    row.id,
                    row.kind.as_str(),
                    parent,
                    row.label
                );
            }
        }
        Command::Link {
            source,
            target,
            kind,
        } => {
            let inserted = engine.store_mut().add_dependency(&source, &target, &kind)?;
            if inserted {
                println!("linked {source} -> {target} ({kind})");
            } else {
                println!("link already present: {source} -> {target} ({kind})");
            }
        }
        Command::Resync => {
            let report = engine.resync_documents()?;
            println!(
                "resync: {} document(s), {} updated, {} unchanged, {} missing",
                report.total, report.updated, report.skipped, report.missing
            );
        }
        Command::Snapshot => {
            write_snapshot(&mut engine, config)?;
            return Ok(());
        }
    }

    if refresh_snapshot {
        // Deleting the last node legitimately empties the catalog; the stale
        // snapshot stays on disk rather than failing the command.
        match write_snapshot(&mut engine, config) {
            Ok(()) | Err(EngineError::EmptyCatalog) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn write_snapshot(engine: &mut SyncEngine, config: &CliConfig) -> Result<(), EngineError> {
    let report = engine.write_snapshot(&config.snapshot_out)?;
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    println!(
        "snapshot: {} node(s), {} edge(s) -> {}",
        report.node_count,
        report.edge_count,
        config.snapshot_out.display()
    );
    Ok(())
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let (config, command) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config, command) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_defaults_to_leaf_with_label_from_id() {
        let (config, command) = parse_args(&args(&["create", "N1"])).expect("parse");
        assert_eq!(config.storage_dir, PathBuf::from(".knowledge"));
        assert_eq!(config.docs_root, PathBuf::from("docs/knowledge"));
        match command {
            Command::Create(request) => {
                assert_eq!(request.id, "N1");
                assert_eq!(request.label, "N1");
                assert_eq!(request.kind, NodeKind::Leaf);
                assert!(!request.skip_document);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn create_parses_all_flags() {
        let (_, command) = parse_args(&args(&[
            "--storage-dir",
            "/tmp/s",
            "create",
            "F1",
            "--kind",
            "folder",
            "--label",
            "Folder One",
            "--color",
            "#112233",
            "--sort-order",
            "7",
        ]))
        .expect("parse");
        match command {
            Command::Create(request) => {
                assert_eq!(request.kind, NodeKind::Folder);
                assert_eq!(request.label, "Folder One");
                assert_eq!(request.color.as_deref(), Some("#112233"));
                assert_eq!(request.sort_order, 7);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn update_empty_values_clear_fields() {
        let (_, command) = parse_args(&args(&[
            "update",
            "N1",
            "--summary",
            "",
            "--parent-id",
            "",
            "--label",
            "Renamed",
        ]))
        .expect("parse");
        match command {
            Command::Update(request) => {
                assert_eq!(request.summary, Some(None));
                assert_eq!(request.parent_id, Some(None));
                assert_eq!(request.label.as_deref(), Some("Renamed"));
                assert_eq!(request.color, None, "untouched field stays None");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn update_rejects_empty_label_at_parse_time() {
        let err = parse_args(&args(&["update", "N1", "--label", ""])).expect_err("empty label");
        assert!(err.contains("--label must not be empty"));
    }

    #[test]
    fn link_defaults_its_kind() {
        let (_, command) = parse_args(&args(&["link", "A", "B"])).expect("parse");
        assert_eq!(
            command,
            Command::Link {
                source: "A".to_string(),
                target: "B".to_string(),
                kind: DEFAULT_DEPENDENCY_KIND.to_string(),
            }
        );
    }

    #[test]
    fn rejects_unknown_flags_and_commands() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["create"])).is_err(), "create needs ID");
        assert!(parse_args(&args(&["create", "N1", "extra"])).is_err());
    }

    #[test]
    fn list_and_snapshot_do_not_mutate() {
        let (_, list) = parse_args(&args(&["list", "--include-trashed"])).expect("parse");
        assert!(!list.mutates());
        assert_eq!(list, Command::List { include_trashed: true });

        let (_, snapshot) = parse_args(&args(&["snapshot"])).expect("parse");
        assert!(!snapshot.mutates());

        let (_, delete) = parse_args(&args(&["delete", "N1"])).expect("parse");
        assert!(delete.mutates());
    }
}
