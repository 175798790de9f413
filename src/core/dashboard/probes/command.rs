//! Process probe: runs a command line through `sh -c`.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{ProbeError, ProbeResult, MAX_OUTPUT_BYTES};

/// Shell status for a command that could not be located.
const EXIT_NOT_FOUND: i64 = 127;
/// Shell status for a command that was found but could not be executed.
const EXIT_NOT_EXECUTABLE: i64 = 126;

/// Captured output of a finished shell command.
#[derive(Debug, Clone, Default)]
pub struct ShellOutput {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    /// stdout followed by stderr on its own line, trimmed.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim();
        let joined = match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        };
        joined.trim().to_string()
    }
}

/// Executes a shell command and reports its exit code and output.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    pub command: String,
    pub timeout: Duration,
}

impl CommandProbe {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// A non-zero exit code is a successful probe; only a command that
    /// could not be started is an execution error.
    pub async fn check(&self, cancel: &CancellationToken) -> ProbeResult {
        match run_shell(&self.command, self.timeout, cancel).await {
            Ok(out) => {
                let output = out.combined();
                // sh reports a missing or non-executable command only through
                // these statuses, so a script exiting 127/126 itself is
                // indistinguishable and is reported the same way.
                let error = match out.exit_code {
                    EXIT_NOT_FOUND => Some(ProbeError::CommandNotFound),
                    EXIT_NOT_EXECUTABLE => Some(ProbeError::NotExecutable),
                    _ => None,
                };
                ProbeResult {
                    code: out.exit_code,
                    output,
                    error,
                }
            }
            Err(e) => ProbeResult::failed(e),
        }
    }
}

/// Run `command` through `sh -c`, bounded by `timeout` and `cancel`.
///
/// The child is killed when the deadline expires or the token fires.
pub async fn run_shell(
    command: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ShellOutput, ProbeError> {
    if cancel.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| ProbeError::Spawn(e.to_string()))?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let run = async {
        let (status, stdout, stderr) =
            tokio::join!(child.wait(), read_stream(stdout), read_stream(stderr));
        status.map(|status| (status, stdout, stderr))
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
        outcome = tokio::time::timeout(timeout, run) => outcome,
    };

    let (status, stdout, stderr) = match outcome {
        Err(_) => return Err(ProbeError::Timeout(timeout)),
        Ok(Err(e)) => return Err(ProbeError::Io(e.to_string())),
        Ok(Ok(done)) => done,
    };

    let exit_code = status.code().ok_or(ProbeError::Signal)?;

    Ok(ShellOutput {
        exit_code: i64::from(exit_code),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

/// Read a stream up to [`MAX_OUTPUT_BYTES`], draining the remainder so the
/// child never blocks on a full pipe.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        if let Err(e) = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await
        {
            log::debug!("reading child output failed after {} bytes: {}", buf.len(), e);
            return buf;
        }
        if let Err(e) = tokio::io::copy(&mut h, &mut tokio::io::sink()).await {
            log::debug!("draining child output failed: {}", e);
        }
    }
    buf
}
