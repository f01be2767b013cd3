//! Config loading entry points

use crate::config::merge::merge_policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::CanopyConfig;
use config::{Config, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`CanopyConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults < global file < workspace files < environment.
    pub fn load(workspace_root: &Path) -> Result<CanopyConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;

        let mut config: CanopyConfig = builder.build()?.try_deserialize()?;
        environment::apply_token_fallback(&mut config);
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single file, bypassing the other layers. The token fallback
    /// still applies.
    pub fn load_from_file(path: &Path) -> Result<CanopyConfig, ConfigError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::Message(format!("Non UTF-8 config path: {:?}", path)))?;
        let mut config: CanopyConfig = merge_policy::builder_with_defaults()?
            .add_source(File::with_name(path_str).required(true))
            .build()?
            .try_deserialize()?;
        environment::apply_token_fallback(&mut config);
        Ok(config)
    }

    /// Where the global config file is looked up.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<CanopyConfig, ConfigError> {
        let config: Config = merge_policy::builder_with_defaults()?.build()?;
        config.try_deserialize()
    }
}
