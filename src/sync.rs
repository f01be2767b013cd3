//! Source-Control Sync Client
//!
//! Maps the tree to push and pull against a remote repository. Push
//! serializes the whole tree and submits it as one commit; pull fetches a
//! snapshot and swaps it in as the tree-of-record. Both refuse to run, and
//! never contact the remote, until a remote identifier and a credential are
//! configured.

pub mod github;
pub mod remote;

pub use github::GitHubRemote;
pub use remote::{Credential, RemoteRef};

use crate::error::SyncError;
use crate::tree::{Snapshot, Tree, TreeStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Commit message used when the caller supplies none
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update files";

/// Acknowledgement of an applied commit
///
/// The revision id is only logged; nothing downstream stores it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitAck {
    pub revision: Option<String>,
}

/// The external source-control host
#[async_trait]
pub trait RemoteCollaborator: Send + Sync {
    async fn fetch_tree_snapshot(
        &self,
        remote: &RemoteRef,
        credential: &Credential,
    ) -> Result<Snapshot, SyncError>;

    async fn apply_commit(
        &self,
        remote: &RemoteRef,
        credential: &Credential,
        snapshot: &Snapshot,
        message: &str,
    ) -> Result<CommitAck, SyncError>;
}

/// Sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// `owner/repo` or a repository URL
    #[serde(default)]
    pub remote: Option<String>,

    /// Access token; `GITHUB_TOKEN` is used when unset
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub branch: Option<String>,

    /// Repository file holding the snapshot
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

fn default_api_base() -> String {
    github::GITHUB_API_BASE.to_string()
}

fn default_snapshot_path() -> String {
    "project.json".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote: None,
            token: None,
            api_base: default_api_base(),
            branch: None,
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl SyncConfig {
    /// Checks the values that are set. A missing remote or token is not an
    /// error here; push and pull report it when they are attempted.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(remote) = self.remote.as_deref().filter(|r| !r.trim().is_empty()) {
            remote.parse::<RemoteRef>().map_err(|e| e.to_string())?;
        }
        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            return Err(format!("api_base '{}' must be an http(s) URL", self.api_base));
        }
        if self.snapshot_path.trim_matches('/').is_empty() {
            return Err("snapshot_path cannot be empty".to_string());
        }
        Ok(())
    }

    /// Copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}

pub struct SyncClient {
    remote: Option<String>,
    credential: Option<Credential>,
    collaborator: Arc<dyn RemoteCollaborator>,
}

impl SyncClient {
    pub fn new(
        remote: Option<String>,
        credential: Option<Credential>,
        collaborator: Arc<dyn RemoteCollaborator>,
    ) -> Self {
        Self {
            remote,
            credential,
            collaborator,
        }
    }

    /// Client talking to GitHub as described by `config`.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        Ok(Self::new(
            config.remote.clone(),
            Credential::from_token(config.token.as_deref()),
            Arc::new(GitHubRemote::from_config(config)?),
        ))
    }

    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.configured().is_ok()
    }

    fn configured(&self) -> Result<(RemoteRef, &Credential), SyncError> {
        let remote = self
            .remote
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                SyncError::Configuration("Remote repository is not set".to_string())
            })?
            .parse::<RemoteRef>()?;
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| SyncError::Configuration("Access token is not set".to_string()))?;
        Ok((remote, credential))
    }

    /// Submit the whole of `tree` as one commit.
    #[instrument(skip(self, tree), fields(nodes = tree.len()))]
    pub async fn push(&self, tree: &Tree, message: &str) -> Result<CommitAck, SyncError> {
        let (remote, credential) = self.configured()?;
        let message = if message.trim().is_empty() {
            DEFAULT_COMMIT_MESSAGE
        } else {
            message
        };
        let snapshot = tree.serialize()?;
        let ack = self
            .collaborator
            .apply_commit(&remote, credential, &snapshot, message)
            .await?;
        info!(
            remote = %remote,
            digest = %snapshot.short_digest(),
            revision = ack.revision.as_deref().unwrap_or("-"),
            "Push completed"
        );
        Ok(ack)
    }

    /// Fetch the remote snapshot and adopt it as the tree-of-record. The
    /// store is left untouched when fetching or decoding fails.
    #[instrument(skip(self, store))]
    pub async fn pull(&self, store: &mut TreeStore) -> Result<Tree, SyncError> {
        let (remote, credential) = self.configured()?;
        let snapshot = self
            .collaborator
            .fetch_tree_snapshot(&remote, credential)
            .await?;
        let tree = Tree::deserialize(snapshot.as_str())?;
        store.replace(tree.clone());
        info!(
            remote = %remote,
            digest = %snapshot.short_digest(),
            nodes = tree.len(),
            "Pull completed"
        );
        Ok(tree)
    }
}
