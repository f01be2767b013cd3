//! Error types for the Canopy project tree.

use thiserror::Error;

/// Tree Store errors. Every variant is raised before a new tree is built,
/// so the tree-of-record is never touched by a failing operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Parent folder not found: {0}")]
    ParentNotFound(String),

    #[error("An entry named '{name}' already exists in {parent}")]
    DuplicateName { parent: String, name: String },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Cannot move {path} into {destination}")]
    InvalidMove { path: String, destination: String },

    #[error("{path} would be nested deeper than {max} levels")]
    TooDeep { path: String, max: usize },
}

/// Snapshot codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Parse(String),

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}

/// Editing Session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No file is open")]
    NoActiveFile,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Save failed: {0}")]
    Store(#[from] TreeError),
}

/// Host-level sandbox failures. A script that raises is not one of these;
/// it is reported through `RunResult::error`.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Failed to start evaluator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Evaluator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source-control sync errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync not configured: {0}")]
    Configuration(String),

    #[error("Remote authentication failed: {0}")]
    RemoteAuth(String),

    #[error("Remote resource not found: {0}")]
    RemoteNotFound(String),

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Remote returned an unusable snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl SyncError {
    /// True for transport and authentication failures reported by the remote.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteAuth(_) | SyncError::RemoteNotFound(_) | SyncError::Remote(_)
        )
    }
}

/// Facade-level error returned by the workspace and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Project file already exists: {0} (use --force to overwrite)")]
    ProjectExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
