//! Upstream job handlers.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use reelhook_models::Job;

use crate::error::{AdapterError, WorkerError, WorkerResult};

/// Bytes of stderr kept in a [`AdapterError::CommandFailed`].
const STDERR_TAIL: usize = 4096;

/// The upstream handler that does the actual work for a job.
///
/// Called once per job. The returned value is opaque to the worker apart from
/// the artifact keys the dispatcher recognizes.
#[async_trait]
pub trait JobAdapter: Send + Sync {
    async fn run(&self, job: &Job) -> Result<Value, AdapterError>;
}

/// Runs an external command per job.
///
/// The job JSON is written to the command's stdin and the result JSON is read
/// from its stdout. When stdout holds more than a JSON document (log lines
/// before the result), the last non-empty line is used.
#[derive(Debug, Clone)]
pub struct CommandAdapter {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandAdapter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(cmd: &str) -> WorkerResult<Self> {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| WorkerError::config_error("empty handler command"))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl JobAdapter for CommandAdapter {
    async fn run(&self, job: &Job) -> Result<Value, AdapterError> {
        let input = serde_json::to_vec(job)?;

        debug!("Running handler: {} {}", self.program, self.args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AdapterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin is fed while stdout is drained; both pipes are bounded
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    debug!("Handler did not take its input: {}", e);
                }
            })
        });

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| AdapterError::Timeout(timeout))??,
            None => child.wait_with_output().await?,
        };

        if let Some(writer) = writer {
            let _ = writer.await;
        }

        if !output.status.success() {
            return Err(AdapterError::CommandFailed {
                exit_code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        parse_output(&output.stdout)
    }
}

fn parse_output(stdout: &[u8]) -> Result<Value, AdapterError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let last_line = text.lines().rev().map(str::trim).find(|l| !l.is_empty());
    match last_line {
        Some(line) => serde_json::from_str::<Value>(line)
            .map_err(|e| AdapterError::InvalidOutput(format!("{} in {:?}", e, truncate(line, 200)))),
        None => Err(AdapterError::InvalidOutput("empty output".to_string())),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelhook_models::JobInput;
    use serde_json::json;

    fn sh(script: &str) -> CommandAdapter {
        CommandAdapter::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn job() -> Job {
        let input: JobInput = serde_json::from_value(json!({"prompt": "a cat"})).unwrap();
        Job::new("job-1", input)
    }

    #[test]
    fn test_from_command_line() {
        let adapter = CommandAdapter::from_command_line("  python3 handler.py --fast ").unwrap();
        assert_eq!(adapter.program(), "python3");
        assert_eq!(adapter.args, vec!["handler.py", "--fast"]);

        assert!(CommandAdapter::from_command_line("   ").is_err());
    }

    #[test]
    fn test_parse_output_last_line() {
        let value = parse_output(b"loading model\nstep 1/2\n{\"video\": \"AAAA\"}\n").unwrap();
        assert_eq!(value, json!({"video": "AAAA"}));
    }

    #[test]
    fn test_parse_output_multiline_json() {
        let value = parse_output(b"{\n  \"ok\": true\n}\n").unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        assert!(matches!(parse_output(b"done"), Err(AdapterError::InvalidOutput(_))));
        assert!(matches!(parse_output(b"  \n"), Err(AdapterError::InvalidOutput(_))));
    }

    #[tokio::test]
    async fn test_job_is_written_to_stdin() {
        let value = sh("cat").run(&job()).await.unwrap();
        assert_eq!(value, json!({"id": "job-1", "input": {"prompt": "a cat"}}));
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_stderr() {
        let err = sh("echo 'CUDA out of memory' >&2; exit 3")
            .run(&job())
            .await
            .unwrap_err();
        match err {
            AdapterError::CommandFailed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "CUDA out of memory");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = sh("sleep 5")
            .with_timeout(Duration::from_millis(100))
            .run(&job())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = CommandAdapter::new("reelhook-no-such-handler", vec![])
            .run(&job())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_handler_ignoring_stdin() {
        let value = sh("echo '{\"status\": \"ok\"}'").run(&job()).await.unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }
}
