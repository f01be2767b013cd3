//! Remote identifiers and credentials

use crate::error::SyncError;
use std::fmt;
use std::str::FromStr;

/// `owner/repository` on the remote host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    owner: String,
    repo: String,
}

impl RemoteRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, SyncError> {
        let owner = owner.into();
        let repo = repo.into();
        for part in [&owner, &repo] {
            if !is_valid_segment(part) {
                return Err(SyncError::Configuration(format!(
                    "Invalid remote segment '{}'",
                    part
                )));
            }
        }
        Ok(Self { owner, repo })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Accepts `owner/repo`, `github.com/owner/repo`, `https://github.com/owner/repo`
/// and `git@github.com:owner/repo`, each with an optional `.git` suffix.
impl FromStr for RemoteRef {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(SyncError::Configuration(
                "Remote repository is not set".to_string(),
            ));
        }

        let mut rest = raw;
        for scheme in ["https://", "http://"] {
            if let Some(stripped) = rest.strip_prefix(scheme) {
                rest = stripped;
            }
        }
        if let Some(stripped) = rest.strip_prefix("git@github.com:") {
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_prefix("www.") {
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_prefix("github.com/") {
            rest = stripped;
        }
        let rest = rest.trim_end_matches('/');
        let rest = rest.strip_suffix(".git").unwrap_or(rest);

        let parts: Vec<&str> = rest.split('/').collect();
        match parts.as_slice() {
            [owner, repo] => RemoteRef::new(*owner, *repo).map_err(|_| malformed(raw)),
            _ => Err(malformed(raw)),
        }
    }
}

fn malformed(raw: &str) -> SyncError {
    SyncError::Configuration(format!(
        "Remote '{}' is not of the form owner/repository",
        raw
    ))
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Access token for the remote host. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` for a missing or blank token.
    pub fn from_token(token: Option<&str>) -> Option<Self> {
        token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Credential(t.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
