//! Network probe: a single unauthenticated GET.

use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use super::{ProbeError, ProbeResult, MAX_OUTPUT_BYTES};

/// Performs an HTTP GET and reports the status code and body.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    pub url: String,
    pub timeout: Duration,
    /// Optional shared client; a default one is built when absent.
    client: Option<reqwest::Client>,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            client: None,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Any response, including 4xx/5xx, is a successful probe.
    pub async fn check(&self, cancel: &CancellationToken) -> ProbeResult {
        if cancel.is_cancelled() {
            return ProbeResult::failed(ProbeError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => ProbeResult::failed(ProbeError::Cancelled),
            result = self.fetch() => result,
        }
    }

    /// One deadline covers the request and the body read. Once the status
    /// line has arrived its code is kept, even if the body then fails.
    async fn fetch(&self) -> ProbeResult {
        let deadline = Instant::now() + self.timeout;

        let client = match &self.client {
            Some(client) => client.clone(),
            None => match reqwest::Client::builder().build() {
                Ok(client) => client,
                Err(e) => return ProbeResult::failed(ProbeError::Request(e.to_string())),
            },
        };

        let response = match timeout_at(deadline, client.get(&self.url).send()).await {
            Err(_) => return ProbeResult::failed(ProbeError::Timeout(self.timeout)),
            Ok(Err(e)) if e.is_timeout() => {
                return ProbeResult::failed(ProbeError::Timeout(self.timeout));
            }
            Ok(Err(e)) => return ProbeResult::failed(ProbeError::Request(error_chain(&e))),
            Ok(Ok(response)) => response,
        };

        let code = i64::from(response.status().as_u16());
        log::debug!("GET {} -> {}", self.url, code);

        let error = match timeout_at(deadline, read_capped(response, MAX_OUTPUT_BYTES)).await {
            Ok(Ok(body)) => return ProbeResult::ok(code, String::from_utf8_lossy(&body).into_owned()),
            Ok(Err(e)) => ProbeError::Body(error_chain(&e)),
            Err(_) => ProbeError::Timeout(self.timeout),
        };
        ProbeResult {
            code,
            output: String::new(),
            error: Some(error),
        }
    }
}

/// Read at most `cap` bytes of the body; the rest is discarded.
async fn read_capped(mut response: reqwest::Response, cap: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let remaining = cap - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// reqwest hides the interesting part (refused, dns) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
