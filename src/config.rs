//! Configuration System
//!
//! Layered configuration: built-in defaults, the global user file, workspace
//! files, then `CANOPY_<SECTION>__<KEY>` environment variables. Validation
//! collects every problem instead of stopping at the first.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::sandbox::SandboxConfig;
pub use crate::sync::SyncConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the project tree is persisted between commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Snapshot file, relative to the workspace root unless absolute
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: PathBuf,
}

fn default_snapshot_file() -> PathBuf {
    PathBuf::from("project.json")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            snapshot_file: default_snapshot_file(),
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.snapshot_file.as_os_str().is_empty() {
            return Err("Snapshot file cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Project(String),
    Sync(String),
    Sandbox(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Project(msg) => write!(f, "Project: {}", msg),
            ValidationError::Sync(msg) => write!(f, "Sync: {}", msg),
            ValidationError::Sandbox(msg) => write!(f, "Sandbox: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CanopyConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.project.validate() {
            errors.push(ValidationError::Project(e));
        }
        if let Err(e) = self.sync.validate() {
            errors.push(ValidationError::Sync(e));
        }
        if let Err(e) = self.sandbox.validate() {
            errors.push(ValidationError::Sandbox(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one `ConfigError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Effective configuration as TOML, token masked.
    pub fn to_redacted_toml(&self) -> Result<String, ApiError> {
        let printable = CanopyConfig {
            sync: self.sync.redacted(),
            ..self.clone()
        };
        toml::to_string_pretty(&printable)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
