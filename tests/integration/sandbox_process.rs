//! Child-process sandbox driven through configuration

#![cfg(unix)]

use super::test_utils::scenario_tree;
use canopy::sandbox::{ExecutionSandbox, RunOutcome, SandboxConfig};
use canopy::sync::{Credential, GitHubRemote, SyncClient};
use canopy::tree::NodeKind;
use canopy::Workspace;
use std::sync::Arc;

fn shell_config() -> SandboxConfig {
    SandboxConfig {
        program: "sh".to_string(),
        extension: ".sh".to_string(),
        timeout_ms: 2_000,
        ..SandboxConfig::default()
    }
}

#[tokio::test]
async fn test_shell_script_output_in_order() {
    let sandbox = ExecutionSandbox::from_config(&shell_config());
    let outcome = sandbox
        .run_file("build.sh", "echo one\necho two\necho three\n")
        .await
        .unwrap();
    let RunOutcome::Completed(result) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(result.output, vec!["one", "two", "three"]);
    assert!(result.succeeded());
}

#[tokio::test]
async fn test_only_configured_extension_runs() {
    let sandbox = ExecutionSandbox::from_config(&shell_config());
    let outcome = sandbox.run_file("index.js", "echo nope").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Unsupported { .. }));
    assert!(!sandbox.supports(".sh"));
}

#[tokio::test]
async fn test_environment_is_cleared() {
    std::env::set_var("CANOPY_SANDBOX_LEAK", "leaked");
    let sandbox = ExecutionSandbox::from_config(&shell_config());
    let result = sandbox
        .run("echo \"leak=${CANOPY_SANDBOX_LEAK:-unset}\"")
        .await
        .unwrap();
    std::env::remove_var("CANOPY_SANDBOX_LEAK");
    assert_eq!(result.output, vec!["leak=unset"]);
}

#[tokio::test]
async fn test_timeout_reports_fault_with_partial_output() {
    let config = SandboxConfig {
        timeout_ms: 300,
        ..shell_config()
    };
    let sandbox = ExecutionSandbox::from_config(&config);
    let result = sandbox.run("echo started\nsleep 5\necho never\n").await.unwrap();
    assert_eq!(result.output, vec!["started"]);
    let fault = result.error.unwrap();
    assert!(fault.message.contains("timed out"), "{}", fault.message);
}

#[tokio::test]
async fn test_workspace_runs_buffer_through_process() {
    let sandbox = ExecutionSandbox::from_config(&shell_config());
    let sync = SyncClient::new(
        None,
        Credential::from_token(None),
        Arc::new(GitHubRemote::new(None, None, "project.json").unwrap()),
    );
    let tree = scenario_tree()
        .create(None, "hello.sh", NodeKind::File)
        .unwrap();
    let mut ws = Workspace::new(tree, sandbox, sync);

    ws.open("hello.sh").unwrap();
    ws.edit("echo hi\necho 'Error: bad input' >&2\nexit 2").unwrap();
    let start = ws.terminal().len();
    ws.run().await.unwrap();
    assert_eq!(
        ws.terminal().lines_since(start),
        vec!["Running hello.sh...", "hi", "Error: Error: bad input"]
    );
    // Nothing was saved.
    assert_eq!(ws.tree().resolve("hello.sh").unwrap().content(), Some(""));
}
