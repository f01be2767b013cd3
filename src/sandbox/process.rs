//! Child-process evaluator
//!
//! Each evaluation starts a fresh process of the configured program in a
//! scratch directory, writes the script to its stdin, and collects stdout
//! line by line. The process is killed when the timeout elapses; whatever
//! it printed until then is still returned.

use crate::error::SandboxError;
use crate::sandbox::{EvaluationFault, Evaluator, RunResult, SandboxConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};

/// How long to wait for the output pipes to drain once the process is gone.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

pub struct ProcessEvaluator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    clear_env: bool,
}

impl ProcessEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let defaults = SandboxConfig::default();
        Self {
            program: program.into(),
            args,
            timeout: defaults.timeout(),
            clear_env: defaults.clear_env,
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
            clear_env: config.clear_env,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, scratch: &std::path::Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(scratch)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.clear_env {
            command.env_clear();
            if let Some(path) = std::env::var_os("PATH") {
                command.env("PATH", path);
            }
        }
        command
    }
}

#[async_trait]
impl Evaluator for ProcessEvaluator {
    async fn evaluate(&self, source: &str) -> Result<RunResult, SandboxError> {
        let scratch = tempfile::tempdir()?;
        let mut child = self
            .command(scratch.path())
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!(program = %self.program, pid = ?child.id(), "Evaluator started");

        let captured = Arc::new(Mutex::new(Vec::new()));
        let stdout_task = tokio::spawn(collect_lines(child.stdout.take(), Arc::clone(&captured)));
        let stderr_task = tokio::spawn(collect_text(child.stderr.take()));

        let mut stdin = child.stdin.take();
        let run = async {
            if let Some(mut pipe) = stdin.take() {
                if let Err(e) = pipe.write_all(source.as_bytes()).await {
                    // The script may exit without reading its input.
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
            }
            child.wait().await
        };
        let waited = tokio::time::timeout(self.timeout, run).await;

        let status = match waited {
            Ok(status) => Some(status?),
            Err(_) => {
                warn!(
                    program = %self.program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Evaluator timed out, killing"
                );
                if let Err(e) = child.start_kill() {
                    debug!("Failed to kill evaluator: {}", e);
                }
                let _ = child.wait().await;
                None
            }
        };

        let drained = tokio::time::timeout(
            PIPE_DRAIN_GRACE,
            futures::future::join(stdout_task, stderr_task),
        )
        .await;
        let stderr_text = match drained {
            Ok((_, Ok(text))) => text,
            _ => String::new(),
        };
        if !stderr_text.trim().is_empty() {
            debug!(stderr = %stderr_text.trim_end(), "Evaluator stderr");
        }

        let output = std::mem::take(&mut *captured.lock());
        let error = match status {
            None => Some(EvaluationFault::new(format!(
                "execution timed out after {} ms",
                self.timeout.as_millis()
            ))),
            Some(status) if status.success() => None,
            Some(status) => Some(EvaluationFault::new(fault_message(&stderr_text, status))),
        };

        Ok(RunResult { output, error })
    }

    fn name(&self) -> &str {
        &self.program
    }
}

async fn collect_lines(stdout: Option<ChildStdout>, sink: Arc<Mutex<Vec<String>>>) {
    let Some(stdout) = stdout else {
        return;
    };
    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                sink.lock().push(String::from_utf8_lossy(&line).into_owned());
            }
            Err(e) => {
                debug!("Error reading evaluator stdout: {}", e);
                break;
            }
        }
    }
}

async fn collect_text(stderr: Option<ChildStderr>) -> String {
    let Some(mut stderr) = stderr else {
        return String::new();
    };
    let mut bytes = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut bytes).await {
        debug!("Error reading evaluator stderr: {}", e);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Pick the raised message out of the evaluator's stderr.
fn fault_message(stderr: &str, status: ExitStatus) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if let Some(line) = lines.iter().find(|l| is_error_line(l)) {
        return line.to_string();
    }
    if let Some(line) = lines.last() {
        return line.to_string();
    }
    match status.code() {
        Some(code) => format!("process exited with status {}", code),
        None => "process terminated by signal".to_string(),
    }
}

/// `TypeError: x is not a function`, `Error: boom`, `ValueException: ...`
fn is_error_line(line: &str) -> bool {
    line.split_once(':')
        .map(|(head, _)| {
            !head.is_empty()
                && !head.contains(char::is_whitespace)
                && (head.ends_with("Error") || head.ends_with("Exception"))
        })
        .unwrap_or(false)
}
