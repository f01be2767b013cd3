//! Workspace facade
//!
//! One editing session over one project tree. Every mutating or executing
//! operation records its outcome in the terminal log, failures included,
//! and failures leave the tree and the buffer as they were.

use crate::config::CanopyConfig;
use crate::error::{ApiError, SessionError};
use crate::sandbox::{ExecutionSandbox, RunOutcome};
use crate::session::EditingSession;
use crate::sync::{CommitAck, SyncClient};
use crate::terminal::TerminalLog;
use crate::tree::{filter, path, seed, FilteredView, NodeKind, Snapshot, Tree, TreeStore};
use tracing::{debug, instrument};

pub struct Workspace {
    store: TreeStore,
    session: EditingSession,
    terminal: TerminalLog,
    sandbox: ExecutionSandbox,
    sync: SyncClient,
}

impl Workspace {
    pub fn new(tree: Tree, sandbox: ExecutionSandbox, sync: SyncClient) -> Self {
        Self {
            store: TreeStore::new(tree),
            session: EditingSession::new(),
            terminal: TerminalLog::with_welcome(),
            sandbox,
            sync,
        }
    }

    /// Workspace over the default starter project.
    pub fn seeded(sandbox: ExecutionSandbox, sync: SyncClient) -> Self {
        Self::new(seed::default_project(), sandbox, sync)
    }

    /// Workspace whose sandbox and sync client are built from `config`.
    pub fn from_config(config: &CanopyConfig, tree: Tree) -> Result<Self, ApiError> {
        let sandbox = ExecutionSandbox::from_config(&config.sandbox);
        let sync = SyncClient::from_config(&config.sync)?;
        Ok(Self::new(tree, sandbox, sync))
    }

    pub fn tree(&self) -> Tree {
        self.store.tree()
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn terminal(&self) -> &TerminalLog {
        &self.terminal
    }

    pub fn sandbox(&self) -> &ExecutionSandbox {
        &self.sandbox
    }

    pub fn search(&self, query: &str) -> FilteredView {
        filter(self.store.current(), query)
    }

    fn record<T, E>(
        &mut self,
        result: Result<T, E>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, ApiError>
    where
        E: Into<ApiError>,
    {
        match result {
            Ok(value) => {
                let line = success(&value);
                self.terminal.push(line);
                Ok(value)
            }
            Err(e) => {
                let err = e.into();
                self.terminal.push(format!("Error: {}", err));
                Err(err)
            }
        }
    }

    pub fn create_file(&mut self, parent: Option<&str>, name: &str) -> Result<Tree, ApiError> {
        let result = self.store.create(parent, name, NodeKind::File);
        self.record(result, |_| format!("Created file: {}", name))
    }

    pub fn create_folder(&mut self, parent: Option<&str>, name: &str) -> Result<Tree, ApiError> {
        let result = self.store.create(parent, name, NodeKind::Folder);
        self.record(result, |_| format!("Created folder: {}", name))
    }

    /// Create a node addressed by its full path (`src/util.js`).
    pub fn create_at(&mut self, full_path: &str, kind: NodeKind) -> Result<Tree, ApiError> {
        let normalized = path::normalize_path_string(full_path);
        let (parent, name) = path::split_parent(&normalized);
        match kind {
            NodeKind::File => self.create_file(parent.as_deref(), &name),
            NodeKind::Folder => self.create_folder(parent.as_deref(), &name),
        }
    }

    pub fn rename(&mut self, node_path: &str, new_name: &str) -> Result<Tree, ApiError> {
        let result = self.store.rename(node_path, new_name);
        self.record(result, |_| format!("Renamed: {} -> {}", node_path, new_name))
    }

    pub fn move_node(&mut self, node_path: &str, new_parent: Option<&str>) -> Result<Tree, ApiError> {
        let result = self.store.move_node(node_path, new_parent);
        let destination = new_parent.unwrap_or("/");
        self.record(result, |_| format!("Moved: {} -> {}", node_path, destination))
    }

    pub fn delete(&mut self, node_path: &str) -> Result<Tree, ApiError> {
        let result = self.store.delete(node_path);
        self.record(result, |_| format!("Deleted: {}", node_path))
    }

    /// Bind a file. Any unsaved buffer is discarded.
    pub fn open(&mut self, node_path: &str) -> Result<(), ApiError> {
        if self.session.has_unsaved_changes(self.store.current()) {
            debug!(
                path = self.session.active_path().unwrap_or_default(),
                "Discarding unsaved buffer"
            );
        }
        let result = self.session.open(self.store.current(), node_path);
        self.record(result, |_| format!("Opened: {}", node_path))
    }

    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), ApiError> {
        self.session.edit(text).map_err(ApiError::from)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.session.has_unsaved_changes(self.store.current())
    }

    pub fn save(&mut self) -> Result<Tree, ApiError> {
        let result = self.session.save(&mut self.store);
        let name = self.session.active_name().unwrap_or_default().to_string();
        self.record(result, |_| format!("Saved: {}", name))
    }

    /// Run the active buffer. Output lines are appended to the terminal log
    /// in emission order, followed by the raised message if any.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunOutcome, ApiError> {
        let (name, buffer) = match (self.session.active_name(), self.session.buffer()) {
            (Some(name), Some(buffer)) => (name.to_string(), buffer.to_string()),
            _ => {
                let err = ApiError::from(SessionError::NoActiveFile);
                self.terminal.push(format!("Error: {}", err));
                return Err(err);
            }
        };

        if !self.sandbox.supports(&name) {
            self.terminal.push(format!(
                "Only {} files can be executed",
                self.sandbox.extension()
            ));
            return Ok(RunOutcome::Unsupported {
                name,
                extension: self.sandbox.extension().to_string(),
            });
        }

        self.terminal.push(format!("Running {}...", name));
        let outcome = self.sandbox.run_file(&name, &buffer).await;
        match outcome {
            Ok(RunOutcome::Completed(result)) => {
                for line in &result.output {
                    self.terminal.push(line.clone());
                }
                if let Some(fault) = &result.error {
                    self.terminal.push(format!("Error: {}", fault));
                }
                Ok(RunOutcome::Completed(result))
            }
            Ok(other) => Ok(other),
            Err(e) => {
                let err = ApiError::from(e);
                self.terminal.push(format!("Error: {}", err));
                Err(err)
            }
        }
    }

    pub async fn push(&mut self, message: &str) -> Result<CommitAck, ApiError> {
        if let Some(remote) = self.sync.remote().filter(|r| !r.trim().is_empty()) {
            self.terminal.push(format!("Pushing to {}...", remote));
        }
        let tree = self.store.tree();
        let result = self.sync.push(&tree, message).await;
        self.record(result, |_| "Push completed".to_string())
    }

    /// Replace the tree with the remote snapshot. An open buffer is not
    /// reconciled against it.
    pub async fn pull(&mut self) -> Result<Tree, ApiError> {
        if let Some(remote) = self.sync.remote().filter(|r| !r.trim().is_empty()) {
            self.terminal.push(format!("Pulling from {}...", remote));
        }
        let result = self.sync.pull(&mut self.store).await;
        let tree = self.record(result, |_| "Pull completed successfully".to_string())?;
        if let Some(active) = self.session.active_path() {
            if !tree.contains(active) || self.session.has_unsaved_changes(&tree) {
                let line = format!("Open buffer for {} may be stale", active);
                self.terminal.push(line);
            }
        }
        Ok(tree)
    }

    pub fn export_snapshot(&mut self) -> Result<Snapshot, ApiError> {
        let result = self.store.serialize();
        self.record(result, |s| format!("Project exported ({})", s.short_digest()))
    }

    /// Replace the tree with a snapshot; nothing changes if it does not parse.
    pub fn import_snapshot(&mut self, text: &str) -> Result<Tree, ApiError> {
        let result = self.store.load_snapshot(text);
        self.record(result, |_| "Project uploaded successfully".to_string())
    }
}
