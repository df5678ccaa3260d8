#![forbid(unsafe_code)]

use kn_core::model::NodeKind;
use kn_engine::{CreateNodeRequest, EngineError, SyncEngine, UpdateNodeRequest};
use kn_storage::StoreError;
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("kn_engine_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn open_engine(test_name: &str) -> (SyncEngine, PathBuf) {
    let dir = temp_dir(test_name);
    let docs_root = dir.join("docs");
    let engine = SyncEngine::open(dir.join("storage"), &docs_root).expect("open engine");
    (engine, docs_root)
}

fn folder(id: &str, parent_id: Option<&str>) -> CreateNodeRequest {
    CreateNodeRequest {
        id: id.to_string(),
        label: format!("Folder {id}"),
        kind: NodeKind::Folder,
        parent_id: parent_id.map(str::to_string),
        summary: None,
        color: None,
        doc_path: None,
        sort_order: 0,
        skip_document: false,
    }
}

fn leaf(id: &str, parent_id: Option<&str>) -> CreateNodeRequest {
    CreateNodeRequest {
        id: id.to_string(),
        label: format!("Leaf {id}"),
        kind: NodeKind::Leaf,
        parent_id: parent_id.map(str::to_string),
        summary: None,
        color: None,
        doc_path: None,
        sort_order: 0,
        skip_document: false,
    }
}

#[test]
fn create_trash_restore_scenario() {
    let (mut engine, docs_root) = open_engine("create_trash_restore_scenario");

    engine.create_node(folder("F1", None)).expect("create F1");
    let n1 = engine
        .create_node(CreateNodeRequest {
            label: "Intro".to_string(),
            ..leaf("N1", Some("F1"))
        })
        .expect("create N1");

    // Document path derives from the root of the parent chain.
    assert_eq!(n1.doc_path.as_deref(), Some("F1/N1.md"));
    let doc_file = docs_root.join("F1/N1.md");
    let original_bytes = std::fs::read(&doc_file).expect("template written");
    assert!(String::from_utf8_lossy(&original_bytes).starts_with("# Intro\n"));

    let receipt = engine.trash_node("F1").expect("trash F1");
    assert_eq!(receipt.nodes_trashed, 2);
    assert_eq!(receipt.docs_archived, 1);
    assert!(!doc_file.exists(), "document must leave its live location");
    let archived = docs_root
        .join("_trash")
        .join(&receipt.trash_tx_id)
        .join("F1/N1.md");
    assert!(archived.is_file(), "document must land in the trash namespace");

    for id in ["F1", "N1"] {
        let row = engine.store().get_node(id).expect("get").expect("row");
        assert!(row.is_trashed);
        assert_eq!(row.trash_tx_id.as_deref(), Some(receipt.trash_tx_id.as_str()));
    }

    let restored = engine.restore_node("F1").expect("restore F1");
    assert_eq!(restored.trash_tx_id, receipt.trash_tx_id);
    assert_eq!(restored.nodes_restored, 2);
    assert_eq!(restored.docs_restored, 1);

    assert_eq!(
        std::fs::read(&doc_file).expect("document back in place"),
        original_bytes,
        "restore must reproduce byte-identical content"
    );
    assert!(!archived.exists());
    for id in ["F1", "N1"] {
        let row = engine.store().get_node(id).expect("get").expect("row");
        assert!(!row.is_trashed);
        assert_eq!(row.trash_tx_id, None);
        assert_eq!(row.trashed_at_ms, None);
        assert_eq!(row.trashed_parent_id, None);
    }
}

#[test]
fn create_compensates_document_when_insert_fails() {
    let (mut engine, docs_root) = open_engine("create_compensates_document_when_insert_fails");

    engine.create_node(leaf("A", None)).expect("first create");

    // Same id, fresh document path: the document write succeeds and the
    // structural insert fails, so the compensation must remove the file.
    let err = engine
        .create_node(CreateNodeRequest {
            doc_path: Some("A/copy.md".to_string()),
            ..leaf("A", None)
        })
        .expect_err("duplicate id must fail");
    match err {
        EngineError::Store(StoreError::DuplicateId(id)) => assert_eq!(id, "A"),
        other => panic!("expected DuplicateId, got {other:?}"),
    }
    assert!(
        !docs_root.join("A/copy.md").exists(),
        "compensation must remove the orphan document"
    );
}

#[test]
fn create_refuses_to_overwrite_existing_document() {
    let (mut engine, docs_root) = open_engine("create_refuses_to_overwrite_existing_document");

    std::fs::create_dir_all(docs_root.join("B")).expect("mkdir");
    std::fs::write(docs_root.join("B/B.md"), "# handwritten\n").expect("seed file");

    let err = engine
        .create_node(leaf("B", None))
        .expect_err("existing document must abort creation");
    assert!(matches!(err, EngineError::DocumentExists(path) if path == "B/B.md"));

    assert!(
        engine.store().get_node("B").expect("get").is_none(),
        "no structural row may be left behind"
    );
    assert_eq!(
        std::fs::read_to_string(docs_root.join("B/B.md")).expect("read"),
        "# handwritten\n",
        "the existing document must be untouched"
    );
}

#[test]
fn create_precondition_failures() {
    let (mut engine, _docs_root) = open_engine("create_precondition_failures");

    let err = engine
        .create_node(CreateNodeRequest {
            doc_path: Some("F/F.md".to_string()),
            ..folder("F", None)
        })
        .expect_err("folder with doc_path");
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .create_node(leaf("N", Some("ghost")))
        .expect_err("missing parent");
    assert!(matches!(err, EngineError::ParentNotFound(parent) if parent == "ghost"));

    engine.create_node(folder("F1", None)).expect("create F1");
    engine.trash_node("F1").expect("trash F1");
    let err = engine
        .create_node(leaf("N", Some("F1")))
        .expect_err("trashed parent");
    assert!(matches!(err, EngineError::ParentNotFound(parent) if parent == "F1"));

    let err = engine
        .create_node(CreateNodeRequest {
            doc_path: Some("../escape.md".to_string()),
            ..leaf("E", None)
        })
        .expect_err("escaping doc_path");
    assert!(matches!(err, EngineError::PathEscape(_)));
}

#[test]
fn skip_document_leaf_keeps_path_but_writes_nothing() {
    let (mut engine, docs_root) = open_engine("skip_document_leaf_keeps_path_but_writes_nothing");

    let row = engine
        .create_node(CreateNodeRequest {
            skip_document: true,
            ..leaf("N1", None)
        })
        .expect("create");
    assert_eq!(row.doc_path.as_deref(), Some("N1/N1.md"));
    assert!(!docs_root.join("N1/N1.md").exists());

    // Trash and restore tolerate the absent document.
    let receipt = engine.trash_node("N1").expect("trash");
    assert_eq!(receipt.docs_archived, 0);
    let restored = engine.restore_node("N1").expect("restore");
    assert_eq!(restored.docs_restored, 0);
}

#[test]
fn restore_blocked_while_parent_trashed() {
    let (mut engine, _docs_root) = open_engine("restore_blocked_while_parent_trashed");

    engine.create_node(folder("F1", None)).expect("create F1");
    engine.create_node(leaf("N1", Some("F1"))).expect("create N1");
    engine.trash_node("F1").expect("trash");

    let err = engine
        .restore_node("N1")
        .expect_err("child restore must wait for the parent");
    match err {
        EngineError::ParentStillTrashed { id, parent } => {
            assert_eq!(id, "N1");
            assert_eq!(parent, "F1");
        }
        other => panic!("expected ParentStillTrashed, got {other:?}"),
    }

    // Restoring the root releases the whole generation, child included.
    let receipt = engine.restore_node("F1").expect("restore root");
    assert_eq!(receipt.nodes_restored, 2);
    let err = engine.restore_node("N1").expect_err("already restored");
    assert!(matches!(err, EngineError::NotTrashed(_)));
}

#[test]
fn update_moves_document_and_patches_fields() {
    let (mut engine, docs_root) = open_engine("update_moves_document_and_patches_fields");

    engine.create_node(leaf("N1", None)).expect("create");
    let before = std::fs::read(docs_root.join("N1/N1.md")).expect("read");

    let updated = engine
        .update_node(UpdateNodeRequest {
            id: "N1".to_string(),
            label: Some("Renamed".to_string()),
            doc_path: Some(Some("archive/N1.md".to_string())),
            ..UpdateNodeRequest::default()
        })
        .expect("update");

    assert_eq!(updated.label, "Renamed");
    assert_eq!(updated.doc_path.as_deref(), Some("archive/N1.md"));
    assert!(!docs_root.join("N1/N1.md").exists());
    assert_eq!(
        std::fs::read(docs_root.join("archive/N1.md")).expect("moved file"),
        before
    );
}

#[test]
fn update_rejects_doc_path_on_folders() {
    let (mut engine, docs_root) = open_engine("update_rejects_doc_path_on_folders");

    engine.create_node(folder("F1", None)).expect("create F1");

    let err = engine
        .update_node(UpdateNodeRequest {
            id: "F1".to_string(),
            doc_path: Some(Some("F1/F1.md".to_string())),
            ..UpdateNodeRequest::default()
        })
        .expect_err("folder must not acquire a doc_path");
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let row = engine.store().get_node("F1").expect("get").expect("row");
    assert_eq!(row.doc_path, None, "row must stay without a doc slot");
    assert!(!docs_root.join("F1/F1.md").exists());

    // Clearing the (absent) doc path is still a valid folder patch.
    let row = engine
        .update_node(UpdateNodeRequest {
            id: "F1".to_string(),
            doc_path: Some(None),
            ..UpdateNodeRequest::default()
        })
        .expect("clearing is allowed");
    assert_eq!(row.doc_path, None);
}

#[test]
fn lifecycle_state_preconditions() {
    let (mut engine, _docs_root) = open_engine("lifecycle_state_preconditions");

    let err = engine.trash_node("ghost").expect_err("unknown id");
    assert!(matches!(err, EngineError::Store(StoreError::NotFound(_))));

    engine.create_node(leaf("N1", None)).expect("create");
    engine.trash_node("N1").expect("trash");

    let err = engine.trash_node("N1").expect_err("already trashed");
    assert!(matches!(err, EngineError::NodeTrashed(_)));

    let err = engine
        .update_node(UpdateNodeRequest {
            id: "N1".to_string(),
            label: Some("nope".to_string()),
            ..UpdateNodeRequest::default()
        })
        .expect_err("update on trashed node");
    assert!(matches!(err, EngineError::NodeTrashed(_)));

    engine.restore_node("N1").expect("restore");
    let err = engine.restore_node("N1").expect_err("restore on live node");
    assert!(matches!(err, EngineError::NotTrashed(_)));
}
