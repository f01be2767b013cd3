//! CLI route: single route table and run context. Dispatches to the workspace
//! facade and presentation.
//!
//! Every command loads the project from its snapshot file (or the starter
//! project when the file does not exist), runs against a fresh workspace and
//! writes the snapshot back when the tree changed.

use crate::cli::help::{command_name, is_mutating};
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_tree_json, format_tree_text};
use crate::cli::shell::Shell;
use crate::config::{CanopyConfig, ConfigLoader};
use crate::error::ApiError;
use crate::sandbox::RunOutcome;
use crate::terminal::render_lines;
use crate::tree::{seed, NodeKind, Tree};
use crate::workspace::Workspace;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{debug, info, info_span};

/// Runtime context for CLI execution: workspace root, effective config and
/// the resolved snapshot file.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CanopyConfig,
    snapshot_path: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root, optional config path and
    /// optional snapshot override. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        project: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config, project)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(
        workspace_root: PathBuf,
        config: CanopyConfig,
        project: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let snapshot_file = project.unwrap_or_else(|| config.project.snapshot_file.clone());
        let snapshot_path = if snapshot_file.is_absolute() {
            snapshot_file
        } else {
            workspace_root.join(snapshot_file)
        };
        Ok(Self {
            workspace_root,
            config,
            snapshot_path,
        })
    }

    pub fn config(&self) -> &CanopyConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// The persisted project, or the starter project when none exists yet.
    pub fn load_tree(&self) -> Result<Tree, ApiError> {
        if !self.snapshot_path.exists() {
            debug!(path = %self.snapshot_path.display(), "No snapshot file, using starter project");
            return Ok(seed::default_project());
        }
        let text = std::fs::read_to_string(&self.snapshot_path)?;
        Ok(Tree::deserialize(&text)?)
    }

    fn persist(&self, tree: &Tree) -> Result<(), ApiError> {
        let snapshot = tree.serialize()?;
        let dir = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // Write beside the target and rename over it so readers never see a
        // partial snapshot.
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(snapshot.as_str().as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.snapshot_path)
            .map_err(|e| ApiError::Io(e.error))?;
        info!(
            path = %self.snapshot_path.display(),
            digest = %snapshot.short_digest(),
            "Project saved"
        );
        Ok(())
    }

    fn open_workspace(&self) -> Result<Workspace, ApiError> {
        Workspace::from_config(&self.config, self.load_tree()?)
    }

    fn runtime() -> Result<Runtime, ApiError> {
        Runtime::new().map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))
    }

    /// Execute a CLI command via the single route table. `write` without
    /// `--content` and `shell` read from process stdin.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        self.execute_with_io(command, stdin.lock(), &mut stdout)
    }

    /// Like [`RunContext::execute`], with explicit input and interactive output.
    pub fn execute_with_io<R: BufRead, W: Write>(
        &self,
        command: &Commands,
        input: R,
        out: &mut W,
    ) -> Result<String, ApiError> {
        let span = info_span!("command", name = command_name(command));
        let _entered = span.enter();

        match command {
            Commands::Init { force } => self.handle_init(*force),
            Commands::Config => self.config.to_redacted_toml(),
            Commands::Tree { filter, format } => self.handle_tree(filter.as_deref(), format),
            Commands::Show { path } => {
                let tree = self.load_tree()?;
                let node = tree
                    .resolve(path)
                    .ok_or_else(|| crate::error::TreeError::NotFound(path.clone()))?;
                let content = node
                    .content()
                    .ok_or_else(|| crate::error::TreeError::NotAFile(node.path().to_string()))?;
                Ok(content.to_string())
            }
            Commands::Shell => self.handle_shell(input, out),
            _ => self.handle_workspace_command(command, input),
        }
    }

    fn handle_init(&self, force: bool) -> Result<String, ApiError> {
        if self.snapshot_path.exists() && !force {
            return Err(ApiError::ProjectExists(
                self.snapshot_path.display().to_string(),
            ));
        }
        let tree = seed::default_project();
        self.persist(&tree)?;
        Ok(format!(
            "Initialized project at {} ({} nodes)",
            self.snapshot_path.display(),
            tree.len()
        ))
    }

    fn handle_tree(&self, query: Option<&str>, format: &str) -> Result<String, ApiError> {
        let tree = self.load_tree()?;
        let view = crate::tree::filter(&tree, query.unwrap_or(""));
        match format {
            "text" => Ok(format_tree_text(&view, std::io::stdout().is_terminal())),
            "json" => format_tree_json(&view),
            other => Err(ApiError::InvalidArgument(format!(
                "Unknown format '{}' (expected text or json)",
                other
            ))),
        }
    }

    /// Commands that run through the workspace facade and report the
    /// terminal log lines they produced.
    fn handle_workspace_command<R: BufRead>(
        &self,
        command: &Commands,
        mut input: R,
    ) -> Result<String, ApiError> {
        let mut workspace = self.open_workspace()?;
        let initial = workspace.tree();
        let start = workspace.terminal().len();

        match command {
            Commands::NewFile { path } => {
                workspace.create_at(path, NodeKind::File)?;
            }
            Commands::NewFolder { path } => {
                workspace.create_at(path, NodeKind::Folder)?;
            }
            Commands::Rename { path, name } => {
                workspace.rename(path, name)?;
            }
            Commands::Move { path, to } => {
                workspace.move_node(path, to.as_deref())?;
            }
            Commands::Delete { path } => {
                workspace.delete(path)?;
            }
            Commands::Write { path, content } => {
                let text = match content {
                    Some(text) => text.clone(),
                    None => {
                        let mut buffer = String::new();
                        input.read_to_string(&mut buffer)?;
                        buffer
                    }
                };
                workspace.open(path)?;
                workspace.edit(text)?;
                workspace.save()?;
            }
            Commands::Run { path } => {
                workspace.open(path)?;
                let outcome = Self::runtime()?.block_on(workspace.run())?;
                if let RunOutcome::Completed(result) = &outcome {
                    debug!(succeeded = result.succeeded(), "Run finished");
                }
            }
            Commands::Push { message } => {
                Self::runtime()?.block_on(workspace.push(message))?;
            }
            Commands::Pull => {
                Self::runtime()?.block_on(workspace.pull())?;
            }
            other => {
                return Err(ApiError::InvalidArgument(format!(
                    "'{}' is not a workspace command",
                    command_name(other)
                )))
            }
        }

        let current = workspace.tree();
        if is_mutating(command) && !Tree::ptr_eq(&initial, &current) {
            self.persist(&current)?;
        }
        Ok(render_lines(workspace.terminal().lines_since(start)))
    }

    fn handle_shell<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> Result<String, ApiError> {
        let mut workspace = self.open_workspace()?;
        let initial = workspace.tree();
        let runtime = Self::runtime()?;

        Shell::new(&mut workspace, &runtime, std::io::stdout().is_terminal()).run(input, out)?;

        let mut summary = Vec::new();
        if workspace.has_unsaved_changes() {
            if let Some(path) = workspace.session().active_path() {
                summary.push(format!("Unsaved changes to {} were discarded", path));
            }
        }
        let current = workspace.tree();
        if !Tree::ptr_eq(&initial, &current) {
            self.persist(&current)?;
            summary.push(format!("Project saved to {}", self.snapshot_path.display()));
        }
        Ok(summary.join("\n"))
    }
}
