//! Single-asset HTTP retrieval.
//!
//! The fetcher retrieves one reference at a time, following redirects
//! manually under a hop cap and a single end-to-end deadline covering the
//! whole invocation. It has no persistence side effects — bytes are buffered
//! in memory and handed back to the caller, which keeps the fetcher
//! independently testable against a mock server.
//!
//! Fetch failures are per-reference and never fatal: the scheduler absorbs
//! every [`FetchError`] into the migration mapping as an identity fallback.

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use tracing::{debug, trace, warn};
use url::Url;

use assetporter_shared::{AssetPorterError, Result};

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("assetporter/", env!("CARGO_PKG_VERSION"));

/// Per-reference fetch failure. Terminal for that reference within a run;
/// the original remote URL is kept in the rewritten output.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The end-to-end deadline (all redirect hops included) expired.
    #[error("timed out")]
    Timeout,

    /// Terminal non-2xx status after following redirects.
    #[error("HTTP {0}")]
    Http(u16),

    /// DNS, connection, body-read, or URL-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// HTTP fetcher for individual asset references.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_redirects: usize,
}

impl Fetcher {
    /// Create a fetcher with the given end-to-end timeout and redirect cap.
    ///
    /// Redirects are disabled at the client and followed manually so the
    /// single deadline spans every hop.
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AssetPorterError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout,
            max_redirects,
        })
    }

    /// Fetch the complete body behind `reference`.
    ///
    /// The whole invocation, redirect hops included, runs under one deadline;
    /// on expiry the result is [`FetchError::Timeout`].
    pub async fn fetch(&self, reference: &str) -> std::result::Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.timeout, self.fetch_following_redirects(reference)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(reference, timeout_ms = self.timeout.as_millis() as u64, "fetch timed out");
                Err(FetchError::Timeout)
            }
        }
    }

    /// Redirect-following loop with an explicit hop counter.
    ///
    /// A loop rather than recursion: pathological redirect chains must not
    /// grow the stack.
    async fn fetch_following_redirects(
        &self,
        reference: &str,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let mut current = parse_remote_url(reference)?;

        for hop in 0..=self.max_redirects {
            trace!(url = %current, hop, "requesting");

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(classify_reqwest_error)?;

            let status = response.status();

            if status.is_redirection() {
                let location = redirect_target(&current, status, response.headers())?;
                debug!(from = %current, to = %location, hop, "following redirect");
                current = location;
                continue;
            }

            if status.is_success() {
                let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
                debug!(url = %current, len = bytes.len(), "fetched");
                return Ok(bytes.to_vec());
            }

            return Err(FetchError::Http(status.as_u16()));
        }

        Err(FetchError::Transport(format!(
            "redirect limit of {} exceeded",
            self.max_redirects
        )))
    }
}

/// Parse and validate a reference as an absolute http(s) URL.
fn parse_remote_url(reference: &str) -> std::result::Result<Url, FetchError> {
    let url = Url::parse(reference)
        .map_err(|e| FetchError::Transport(format!("malformed URL '{reference}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::Transport(format!(
            "unsupported scheme '{other}' in '{reference}'"
        ))),
    }
}

/// Resolve the `Location` header of a redirect response against the current URL.
fn redirect_target(
    current: &Url,
    status: StatusCode,
    headers: &header::HeaderMap,
) -> std::result::Result<Url, FetchError> {
    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            FetchError::Transport(format!("redirect {status} without a usable Location header"))
        })?;

    current
        .join(location)
        .map_err(|e| FetchError::Transport(format!("invalid redirect target '{location}': {e}")))
}

/// Map reqwest errors onto the fetch taxonomy.
fn classify_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}
