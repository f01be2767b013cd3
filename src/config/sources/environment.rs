//! Environment source: CANOPY_<SECTION>__<KEY>, plus GITHUB_TOKEN as a credential fallback

use crate::config::CanopyConfig;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("CANOPY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    ))
}

/// Fill a missing sync token from `GITHUB_TOKEN`.
pub fn apply_token_fallback(config: &mut CanopyConfig) {
    let missing = config
        .sync
        .token
        .as_deref()
        .map(|t| t.trim().is_empty())
        .unwrap_or(true);
    if missing {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.trim().is_empty() {
                config.sync.token = Some(token);
            }
        }
    }
}
