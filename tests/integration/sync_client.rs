//! Sync client behavior through the workspace, against a recording remote

use super::test_utils::{scenario_tree, workspace_with};
use canopy::error::{ApiError, SyncError};
use canopy::tree::{Snapshot, Tree};

#[tokio::test]
async fn test_push_sends_whole_tree_as_one_commit() {
    let (mut ws, remote) = workspace_with(scenario_tree(), Some("octo/project"), Some("t"));
    let start = ws.terminal().len();

    let ack = ws.push("first commit").await.unwrap();
    assert!(ack.revision.is_some());
    assert_eq!(remote.calls(), vec!["commit octo/project first commit"]);

    let stored = remote.stored.lock().unwrap().clone().unwrap();
    assert_eq!(Tree::deserialize(stored.as_str()).unwrap(), ws.tree());
    assert_eq!(
        ws.terminal().lines_since(start),
        vec!["Pushing to octo/project...", "Push completed"]
    );
}

#[tokio::test]
async fn test_push_blank_message_uses_default() {
    let (mut ws, remote) = workspace_with(scenario_tree(), Some("octo/project"), Some("t"));
    ws.push("   ").await.unwrap();
    assert_eq!(remote.calls(), vec!["commit octo/project Update files"]);
}

#[tokio::test]
async fn test_pull_replaces_tree_wholesale() {
    let remote_tree = Tree::empty()
        .create(None, "main.js", canopy::tree::NodeKind::File)
        .unwrap();
    let (mut ws, remote) = workspace_with(scenario_tree(), Some("octo/project"), Some("t"));
    *remote.stored.lock().unwrap() = Some(remote_tree.serialize().unwrap());

    ws.open("src/index.js").unwrap();
    let pulled = ws.pull().await.unwrap();
    assert_eq!(pulled, remote_tree);
    assert_eq!(ws.tree(), remote_tree);
    assert!(!ws.tree().contains("README.md"));

    let lines = ws.terminal().lines();
    assert!(lines.contains(&"Pull completed successfully"));
    assert_eq!(
        lines.last(),
        Some(&"Open buffer for src/index.js may be stale")
    );
}

#[tokio::test]
async fn test_pull_of_invalid_snapshot_keeps_local_tree() {
    let (mut ws, remote) = workspace_with(scenario_tree(), Some("octo/project"), Some("t"));
    let duplicated = r#"[
  {"type": "file", "name": "a.js", "path": "a.js", "content": ""},
  {"type": "file", "name": "a.js", "path": "a.js", "content": ""}
]"#;
    *remote.stored.lock().unwrap() = Some(Snapshot::new(duplicated));
    let before = ws.tree();

    let err = ws.pull().await.unwrap_err();
    assert!(matches!(err, ApiError::Sync(SyncError::Snapshot(_))));
    assert!(Tree::ptr_eq(&before, &ws.tree()));
}

#[tokio::test]
async fn test_remote_errors_are_reported_not_retried() {
    let (mut ws, remote) = workspace_with(scenario_tree(), Some("octo/project"), Some("t"));
    // Nothing stored yet: the fake answers not-found.
    let err = ws.pull().await.unwrap_err();
    match err {
        ApiError::Sync(e) => assert!(e.is_remote()),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(remote.calls(), vec!["fetch octo/project"]);
}

#[tokio::test]
async fn test_malformed_remote_is_configuration_error() {
    let (mut ws, remote) = workspace_with(scenario_tree(), Some("just-a-name"), Some("t"));
    let err = ws.push("x").await.unwrap_err();
    assert!(matches!(err, ApiError::Sync(SyncError::Configuration(_))));
    assert!(remote.calls().is_empty());
}
