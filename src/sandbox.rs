//! Execution Sandbox
//!
//! Runs the active buffer through a host evaluator and captures what the
//! script prints, in emission order. A script that raises yields its message
//! as `RunResult::error` together with any output captured before the fault.
//! Running never touches the tree or the buffer.

pub mod process;

pub use process::ProcessEvaluator;

use crate::error::SandboxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Message raised by the evaluated code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFault {
    pub message: String,
}

impl EvaluationFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvaluationFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Captured output of one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub output: Vec<String>,
    pub error: Option<EvaluationFault>,
}

impl RunResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of asking the sandbox to run a named file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunResult),
    /// The file's extension is not executable; informational, not a failure.
    Unsupported { name: String, extension: String },
}

/// Host evaluator seam
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate `source` to completion or fault. `Err` is reserved for host
    /// failures (the evaluator could not run at all).
    async fn evaluate(&self, source: &str) -> Result<RunResult, SandboxError>;

    /// Short label for logs
    fn name(&self) -> &str;
}

/// Sandbox settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Evaluator program; the script is fed through its stdin
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments passed before the script
    #[serde(default)]
    pub args: Vec<String>,

    /// The single executable extension
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Wall-clock limit; the evaluator is killed when it elapses
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Start the evaluator with an empty environment (PATH is kept)
    #[serde(default = "default_true")]
    pub clear_env: bool,
}

fn default_program() -> String {
    "node".to_string()
}

fn default_extension() -> String {
    ".js".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            extension: default_extension(),
            timeout_ms: default_timeout_ms(),
            clear_env: default_true(),
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("Evaluator program cannot be empty".to_string());
        }
        if !self.extension.starts_with('.') || self.extension.len() < 2 {
            return Err(format!(
                "Executable extension '{}' must look like '.js'",
                self.extension
            ));
        }
        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Runs buffers through an evaluator, gated on one executable extension
pub struct ExecutionSandbox {
    evaluator: Arc<dyn Evaluator>,
    extension: String,
}

impl ExecutionSandbox {
    pub fn new(evaluator: Arc<dyn Evaluator>, extension: impl Into<String>) -> Self {
        Self {
            evaluator,
            extension: extension.into(),
        }
    }

    /// Sandbox backed by a child-process evaluator built from `config`.
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(
            Arc::new(ProcessEvaluator::from_config(config)),
            config.extension.clone(),
        )
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// True when `file_name` carries the executable extension.
    pub fn supports(&self, file_name: &str) -> bool {
        file_name.len() > self.extension.len() && file_name.ends_with(&self.extension)
    }

    /// Evaluate `buffer` and capture its output.
    #[instrument(skip_all, fields(evaluator = self.evaluator.name(), bytes = buffer.len()))]
    pub async fn run(&self, buffer: &str) -> Result<RunResult, SandboxError> {
        let result = self.evaluator.evaluate(buffer).await?;
        match &result.error {
            None => info!(lines = result.output.len(), "Evaluation completed"),
            Some(fault) => warn!(lines = result.output.len(), error = %fault, "Evaluation raised"),
        }
        Ok(result)
    }

    /// Run the buffer of the file named `file_name`, or report that the file
    /// type cannot be executed.
    pub async fn run_file(&self, file_name: &str, buffer: &str) -> Result<RunOutcome, SandboxError> {
        if !self.supports(file_name) {
            return Ok(RunOutcome::Unsupported {
                name: file_name.to_string(),
                extension: self.extension.clone(),
            });
        }
        self.run(buffer).await.map(RunOutcome::Completed)
    }
}
