//! Layered configuration through the public loader and the CLI context

use super::test_utils::with_isolated_env;
use canopy::cli::RunContext;
use canopy::config::ConfigLoader;
use tempfile::TempDir;

fn write_workspace_config(root: &std::path::Path, name: &str, body: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_environment_file_layers_over_base() {
    with_isolated_env(|_home| {
        let workspace = TempDir::new().unwrap();
        write_workspace_config(
            workspace.path(),
            "config.toml",
            "[sync]\nremote = \"octo/base\"\nbranch = \"main\"\n",
        );
        write_workspace_config(
            workspace.path(),
            "staging.toml",
            "[sync]\nbranch = \"staging\"\n",
        );

        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.sync.branch.as_deref(), Some("main"));

        std::env::set_var("CANOPY_ENV", "staging");
        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.sync.remote.as_deref(), Some("octo/base"));
        assert_eq!(config.sync.branch.as_deref(), Some("staging"));
    });
}

#[test]
fn test_env_vars_override_files() {
    with_isolated_env(|_home| {
        let workspace = TempDir::new().unwrap();
        write_workspace_config(
            workspace.path(),
            "config.toml",
            "[sandbox]\nprogram = \"deno\"\ntimeout_ms = 500\n",
        );
        std::env::set_var("CANOPY_SANDBOX__TIMEOUT_MS", "2500");
        std::env::set_var("CANOPY_SYNC__TOKEN", "explicit");
        std::env::set_var("GITHUB_TOKEN", "fallback");

        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.sandbox.program, "deno");
        assert_eq!(config.sandbox.timeout_ms, 2500);
        // An explicit token wins over the fallback.
        assert_eq!(config.sync.token.as_deref(), Some("explicit"));
    });
}

#[test]
fn test_run_context_uses_configured_snapshot_file() {
    with_isolated_env(|_home| {
        let workspace = TempDir::new().unwrap();
        write_workspace_config(
            workspace.path(),
            "config.toml",
            "[project]\nsnapshot_file = \"data/tree.json\"\n",
        );

        let ctx = RunContext::new(workspace.path().to_path_buf(), None, None).unwrap();
        assert_eq!(
            ctx.snapshot_path(),
            workspace.path().join("data").join("tree.json")
        );

        let overridden = RunContext::new(
            workspace.path().to_path_buf(),
            None,
            Some(std::path::PathBuf::from("other.json")),
        )
        .unwrap();
        assert_eq!(overridden.snapshot_path(), workspace.path().join("other.json"));
    });
}

#[test]
fn test_invalid_layered_config_fails_context() {
    with_isolated_env(|_home| {
        let workspace = TempDir::new().unwrap();
        write_workspace_config(
            workspace.path(),
            "config.toml",
            "[logging]\nformat = \"xml\"\n",
        );
        let err = RunContext::new(workspace.path().to_path_buf(), None, None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Logging:"), "{}", err);
    });
}

#[test]
fn test_explicit_config_file_bypasses_workspace() {
    with_isolated_env(|_home| {
        let workspace = TempDir::new().unwrap();
        write_workspace_config(
            workspace.path(),
            "config.toml",
            "[sandbox]\nprogram = \"deno\"\n",
        );
        let custom = workspace.path().join("custom.toml");
        std::fs::write(&custom, "[sandbox]\nextension = \".py\"\nprogram = \"python3\"\n").unwrap();

        let ctx = RunContext::new(workspace.path().to_path_buf(), Some(custom), None).unwrap();
        assert_eq!(ctx.config().sandbox.program, "python3");
        assert_eq!(ctx.config().sandbox.extension, ".py");
    });
}
