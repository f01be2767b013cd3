//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("project.snapshot_file", "project.json")?
        .set_default("sync.api_base", "https://api.github.com")?
        .set_default("sync.snapshot_path", "project.json")?
        .set_default("sandbox.program", "node")?
        .set_default("sandbox.extension", ".js")?
        .set_default("sandbox.timeout_ms", 10_000_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
