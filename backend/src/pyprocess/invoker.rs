use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::config::AnalysisConfig;
use crate::upload::models::ClusterCount;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Failed to start analysis process '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("I/O error while waiting for the analysis process: {0}")]
    Io(#[from] std::io::Error),
    #[error("Analysis process failed ({status})")]
    Failed {
        status: String,
        stdout: String,
        stderr: String,
    },
    #[error("Analysis process timed out after {}s", .after.as_secs_f32())]
    TimedOut {
        after: Duration,
        stdout: String,
        stderr: String,
    },
}

impl AnalysisError {
    /// Whatever the process printed before failing, for the operator-facing error body.
    pub fn captured_output(&self) -> Option<(&str, &str)> {
        match self {
            AnalysisError::Failed { stdout, stderr, .. }
            | AnalysisError::TimedOut { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the external clustering script. The command line is always an argument
/// vector: nothing here is ever handed to a shell.
#[derive(Clone, Debug)]
pub struct AnalysisInvoker {
    interpreter: String,
    script: PathBuf,
    timeout: Duration,
}

impl AnalysisInvoker {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.interpreter.clone(),
            config.script.clone(),
            config.timeout(),
        )
    }

    fn command(&self, input: &Path, clusters: ClusterCount) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg(&self.script)
            .arg(input)
            .arg(clusters.to_string())
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    pub async fn run(
        &self,
        input: &Path,
        clusters: ClusterCount,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        log::info!(
            "Running {} {} {} {}",
            self.interpreter,
            self.script.display(),
            input.display(),
            clusters
        );

        let mut child = self
            .command(input, clusters)
            .spawn()
            .map_err(|source| AnalysisError::Spawn {
                program: self.interpreter.clone(),
                source,
            })?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

        // Buffers live outside the timed future so partial output survives a timeout.
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let waited = tokio::time::timeout(self.timeout, async {
            let (out, err, status) = tokio::join!(
                stdout_pipe.read_to_end(&mut stdout_buf),
                stderr_pipe.read_to_end(&mut stderr_buf),
                child.wait()
            );
            out.and(err).and(status)
        })
        .await;

        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill timed out analysis process: {}", e);
                }
                let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
                let stderr = String::from_utf8_lossy(&stderr_buf).into_owned();
                log::error!(
                    "Analysis process timed out after {:?}. stderr: {}",
                    self.timeout,
                    stderr
                );
                return Err(AnalysisError::TimedOut {
                    after: self.timeout,
                    stdout,
                    stderr,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_buf).into_owned();
        log::debug!("Analysis stdout:\n{}", stdout);

        if !status.success() {
            log::error!("Analysis process failed ({}). stderr: {}", status, stderr);
            return Err(AnalysisError::Failed {
                status: describe_status(&status),
                stdout,
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            log::warn!("Analysis process wrote to stderr:\n{}", stderr);
        }

        Ok(AnalysisOutcome { stdout, stderr })
    }
}

fn describe_status(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {}", code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {}", signal);
        }
    }
    status.to_string()
}
