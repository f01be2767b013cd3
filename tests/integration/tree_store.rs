//! Tree Store operations against a multi-level project

use canopy::error::{SnapshotError, TreeError};
use canopy::tree::{NodeKind, Tree, TreeStore};

fn nested() -> Tree {
    Tree::empty()
        .create(None, "app", NodeKind::Folder)
        .unwrap()
        .create(Some("app"), "lib", NodeKind::Folder)
        .unwrap()
        .create(Some("app/lib"), "util.js", NodeKind::File)
        .unwrap()
        .update("app/lib/util.js", "module.exports = 1")
        .unwrap()
        .create(Some("app"), "main.js", NodeKind::File)
        .unwrap()
        .create(None, "docs", NodeKind::Folder)
        .unwrap()
        .create(None, "notes.txt", NodeKind::File)
        .unwrap()
}

fn paths(tree: &Tree) -> Vec<String> {
    tree.walk().map(|n| n.path().to_string()).collect()
}

#[test]
fn test_rename_folder_repaths_subtree() {
    let tree = nested().rename("app", "web").unwrap();
    assert_eq!(
        paths(&tree),
        vec![
            "web",
            "web/lib",
            "web/lib/util.js",
            "web/main.js",
            "docs",
            "notes.txt"
        ]
    );
    assert_eq!(
        tree.resolve("web/lib/util.js").unwrap().content(),
        Some("module.exports = 1")
    );
    assert!(!tree.contains("app"));
}

#[test]
fn test_rename_keeps_position_among_siblings() {
    let tree = nested().rename("docs", "guide").unwrap();
    let names: Vec<&str> = tree.roots().iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["app", "guide", "notes.txt"]);
}

#[test]
fn test_move_appends_to_destination() {
    let tree = nested().move_node("notes.txt", Some("app")).unwrap();
    let app = tree.resolve("app").unwrap();
    let names: Vec<&str> = app.children().iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["lib", "main.js", "notes.txt"]);
    assert_eq!(
        tree.resolve("app/notes.txt").unwrap().path(),
        "app/notes.txt"
    );
}

#[test]
fn test_move_folder_to_root_repaths_descendants() {
    let tree = nested().move_node("app/lib", None).unwrap();
    assert!(tree.contains("lib/util.js"));
    assert_eq!(tree.roots().last().unwrap().name(), "lib");
    assert_eq!(
        tree.resolve("lib/util.js").unwrap().path(),
        "lib/util.js"
    );
}

#[test]
fn test_move_into_own_subtree_is_rejected() {
    let tree = nested();
    for dest in ["app", "app/lib"] {
        let err = tree.move_node("app", Some(dest)).unwrap_err();
        assert!(matches!(err, TreeError::InvalidMove { .. }), "{}", dest);
    }
}

#[test]
fn test_move_onto_file_or_missing_parent() {
    let tree = nested();
    assert!(matches!(
        tree.move_node("docs", Some("notes.txt")).unwrap_err(),
        TreeError::ParentNotFound(_)
    ));
    assert!(matches!(
        tree.move_node("docs", Some("nowhere")).unwrap_err(),
        TreeError::ParentNotFound(_)
    ));
}

#[test]
fn test_move_name_collision() {
    let tree = nested()
        .create(Some("docs"), "main.js", NodeKind::File)
        .unwrap();
    let err = tree.move_node("docs/main.js", Some("app")).unwrap_err();
    assert!(matches!(err, TreeError::DuplicateName { .. }));
}

#[test]
fn test_delete_folder_removes_subtree() {
    let tree = nested().delete("app").unwrap();
    assert_eq!(paths(&tree), vec!["docs", "notes.txt"]);
    assert!(matches!(
        tree.delete("app/main.js").unwrap_err(),
        TreeError::NotFound(_)
    ));
}

#[test]
fn test_untouched_subtrees_are_shared() {
    let before = nested();
    let after = before.update("notes.txt", "hello").unwrap();
    assert!(std::sync::Arc::ptr_eq(
        before.resolve("app").unwrap(),
        after.resolve("app").unwrap()
    ));
    assert_eq!(before.resolve("notes.txt").unwrap().content(), Some(""));
}

#[test]
fn test_update_rejects_folders() {
    let err = nested().update("app", "x").unwrap_err();
    assert!(matches!(err, TreeError::NotFound(_)));
}

#[test]
fn test_store_keeps_tree_on_failure() {
    let mut store = TreeStore::new(nested());
    let before = store.tree();
    assert!(store.create(Some("missing"), "a.js", NodeKind::File).is_err());
    assert!(store.rename("app", "").is_err());
    assert!(store.delete("nope").is_err());
    assert!(Tree::ptr_eq(&before, store.current()));

    let next = store.create(Some("docs"), "a.md", NodeKind::File).unwrap();
    assert!(Tree::ptr_eq(&next, store.current()));
    // The old version is still intact.
    assert!(!before.contains("docs/a.md"));
}

#[test]
fn test_snapshot_round_trip() {
    let tree = nested();
    let snapshot = tree.serialize().unwrap();
    let decoded = Tree::deserialize(snapshot.as_str()).unwrap();
    assert_eq!(decoded, tree);
    assert_eq!(paths(&decoded), paths(&tree));
    assert_eq!(decoded.serialize().unwrap().digest(), snapshot.digest());
}

#[test]
fn test_snapshot_parse_errors() {
    let cases = [
        "not json",
        r#"{"type": "file"}"#,
        r#"[{"type": "link", "name": "a", "path": "a"}]"#,
        r#"[{"type": "file", "name": "a", "path": "b", "content": ""}]"#,
        r#"[{"type": "folder", "name": "d", "path": "d", "children": [
            {"type": "file", "name": "x", "path": "x", "content": ""}
        ]}]"#,
        r#"[{"type": "file", "name": "a/b", "path": "a/b", "content": ""}]"#,
    ];
    for text in cases {
        let err = Tree::deserialize(text).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)), "{}", text);
    }
}

#[test]
fn test_load_snapshot_failure_keeps_store() {
    let mut store = TreeStore::new(nested());
    let before = store.tree();
    assert!(store.load_snapshot("[").is_err());
    assert!(Tree::ptr_eq(&before, store.current()));

    store.load_snapshot("[]").unwrap();
    assert!(store.current().is_empty());
}
