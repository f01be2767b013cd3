//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, SyncError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Sync(SyncError::Configuration(_)) => format!(
            "{}\nSet [sync] remote and token in config/config.toml, or CANOPY_SYNC__REMOTE and GITHUB_TOKEN.",
            e
        ),
        _ => e.to_string(),
    }
}

/// Process exit code for a failed command.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::ConfigError(_) | ApiError::Sync(SyncError::Configuration(_)) => 78,
        ApiError::InvalidArgument(_) => 64,
        _ => 1,
    }
}
