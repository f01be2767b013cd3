//! GitHub remote collaborator
//!
//! Keeps the project snapshot as a single file in a repository and talks to
//! the REST contents API: fetching reads and decodes that file, applying a
//! commit writes the new snapshot over it in one commit.

use crate::error::SyncError;
use crate::sync::{CommitAck, Credential, RemoteCollaborator, RemoteRef, SyncConfig};
use crate::tree::Snapshot;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const SYNC_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SYNC_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const GITHUB_API_VERSION: &str = "2022-11-28";

fn map_http_error(error: reqwest::Error) -> SyncError {
    if let Some(status) = error.status() {
        status_error(status, &error.to_string())
    } else if error.is_timeout() {
        SyncError::Remote(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        SyncError::Remote(format!("Connection error: {}", error))
    } else {
        SyncError::Remote(format!("HTTP error: {}", error))
    }
}

fn status_error(status: StatusCode, detail: &str) -> SyncError {
    match status.as_u16() {
        401 | 403 => SyncError::RemoteAuth(format!("status {}: {}", status, detail)),
        404 => SyncError::RemoteNotFound(format!("status {}: {}", status, detail)),
        _ => SyncError::Remote(format!("Request failed with status {}: {}", status, detail)),
    }
}

fn build_sync_http_client() -> Result<Client, SyncError> {
    Client::builder()
        .user_agent(concat!("canopy/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(SYNC_HTTP_CONNECT_TIMEOUT)
        .timeout(SYNC_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SyncError::Remote(format!("Failed to create HTTP client: {}", e)))
}

/// `GET /repos/{owner}/{repo}/contents/{path}` response, file case
#[derive(Debug, Deserialize)]
pub(crate) struct ContentsPayload {
    pub sha: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

/// Decode the base64 body of a contents payload into snapshot text.
pub(crate) fn decode_contents_payload(payload: &ContentsPayload) -> Result<Snapshot, SyncError> {
    if payload.encoding != "base64" {
        return Err(SyncError::Remote(format!(
            "Unsupported content encoding '{}' (file may be too large for the contents API)",
            payload.encoding
        )));
    }
    // GitHub wraps the base64 body at 60 columns.
    let compact: String = payload
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SyncError::Remote(format!("Invalid base64 content: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| SyncError::Remote(format!("Snapshot is not UTF-8: {}", e)))?;
    Ok(Snapshot::new(text))
}

pub struct GitHubRemote {
    client: Client,
    api_base: String,
    branch: Option<String>,
    snapshot_path: String,
}

impl GitHubRemote {
    pub fn new(
        api_base: Option<String>,
        branch: Option<String>,
        snapshot_path: impl Into<String>,
    ) -> Result<Self, SyncError> {
        let client = build_sync_http_client()?;
        let api_base = api_base
            .unwrap_or_else(|| GITHUB_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            api_base,
            branch,
            snapshot_path: snapshot_path.into().trim_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        Self::new(
            Some(config.api_base.clone()),
            config.branch.clone(),
            config.snapshot_path.clone(),
        )
    }

    pub(crate) fn contents_url(&self, remote: &RemoteRef) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            remote.owner(),
            remote.repo(),
            self.snapshot_path
        )
    }

    fn authorized(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", credential.expose()))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    /// Current contents of the snapshot file, `None` when it does not exist yet.
    async fn get_contents(
        &self,
        remote: &RemoteRef,
        credential: &Credential,
    ) -> Result<Option<ContentsPayload>, SyncError> {
        let mut request = self.client.get(self.contents_url(remote));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }
        let response = self
            .authorized(request, credential)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &error_text));
        }

        let payload: ContentsPayload = response
            .json()
            .await
            .map_err(|e| SyncError::Remote(format!("Failed to parse response: {}", e)))?;
        Ok(Some(payload))
    }
}

#[async_trait]
impl RemoteCollaborator for GitHubRemote {
    #[instrument(skip(self, credential), fields(remote = %remote))]
    async fn fetch_tree_snapshot(
        &self,
        remote: &RemoteRef,
        credential: &Credential,
    ) -> Result<Snapshot, SyncError> {
        let payload = self.get_contents(remote, credential).await?.ok_or_else(|| {
            SyncError::RemoteNotFound(format!("{} has no {}", remote, self.snapshot_path))
        })?;
        debug!(blob = %payload.sha, "Fetched snapshot blob");
        decode_contents_payload(&payload)
    }

    #[instrument(skip(self, credential, snapshot), fields(remote = %remote))]
    async fn apply_commit(
        &self,
        remote: &RemoteRef,
        credential: &Credential,
        snapshot: &Snapshot,
        message: &str,
    ) -> Result<CommitAck, SyncError> {
        let existing = self.get_contents(remote, credential).await?;
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(snapshot.as_str().as_bytes()),
            sha: existing.as_ref().map(|p| p.sha.as_str()),
            branch: self.branch.as_deref(),
        };

        let response = self
            .authorized(self.client.put(self.contents_url(remote)), credential)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &error_text));
        }

        let ack: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Remote(format!("Failed to parse response: {}", e)))?;
        Ok(CommitAck {
            revision: Some(ack.commit.sha),
        })
    }
}
