//! Probes that execute a single check.
//!
//! A probe never fails: every invocation yields exactly one [`ProbeResult`].
//! Whether the probe could run at all is carried in [`ProbeResult::error`];
//! an HTTP 503 or a non-zero exit code is a successful probe outcome.

mod command;
mod http;

pub use command::{run_shell, CommandProbe, ShellOutput};
pub use http::HttpProbe;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::model::Check;
use crate::error::{BoardError, Result};

/// Upper bound on captured response body or process output (1 MiB).
pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Why a probe could not produce a meaningful code/output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("performing request: {0}")]
    Request(String),

    #[error("reading response body: {0}")]
    Body(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("starting shell: {0}")]
    Spawn(String),

    #[error("command not found")]
    CommandNotFound,

    #[error("command not executable")]
    NotExecutable,

    #[error("terminated by signal")]
    Signal,

    #[error("waiting for process: {0}")]
    Io(String),
}

/// Raw outcome of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// HTTP status code or process exit code.
    pub code: i64,
    /// Response body, or combined stdout and stderr.
    pub output: String,
    pub error: Option<ProbeError>,
}

impl ProbeResult {
    pub fn ok(code: i64, output: impl Into<String>) -> Self {
        Self {
            code,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: ProbeError) -> Self {
        Self {
            code: -1,
            output: String::new(),
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Supported check types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Http,
    Command,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Http => "http",
            CheckKind::Command => "command",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(CheckKind::Http),
            "command" => Ok(CheckKind::Command),
            other => Err(BoardError::unsupported_check(other)),
        }
    }
}

/// A ready-to-run probe for one check.
#[derive(Debug, Clone)]
pub enum Probe {
    Http(HttpProbe),
    Command(CommandProbe),
}

impl Probe {
    /// Build the probe matching `kind`, rejecting unknown kinds.
    ///
    /// A zero timeout falls back to the check default.
    pub fn new(kind: &str, target: &str, timeout: Duration) -> Result<Self> {
        let check = Check {
            kind: kind.to_string(),
            target: target.to_string(),
            timeout: Some(timeout),
        };
        Self::from_check(&check)
    }

    pub fn from_check(check: &Check) -> Result<Self> {
        let timeout = check.effective_timeout();
        let probe = match check.kind.parse::<CheckKind>()? {
            CheckKind::Http => Probe::Http(HttpProbe::new(&check.target, timeout)),
            CheckKind::Command => Probe::Command(CommandProbe::new(&check.target, timeout)),
        };
        Ok(probe)
    }

    /// Share a preconfigured HTTP client. No effect on command probes.
    pub fn with_http_client(self, client: reqwest::Client) -> Self {
        match self {
            Probe::Http(probe) => Probe::Http(probe.with_client(client)),
            other => other,
        }
    }

    pub fn kind(&self) -> CheckKind {
        match self {
            Probe::Http(_) => CheckKind::Http,
            Probe::Command(_) => CheckKind::Command,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            Probe::Http(probe) => probe.timeout,
            Probe::Command(probe) => probe.timeout,
        }
    }

    pub async fn check(&self, cancel: &CancellationToken) -> ProbeResult {
        match self {
            Probe::Http(probe) => probe.check(cancel).await,
            Probe::Command(probe) => probe.check(cancel).await,
        }
    }
}
