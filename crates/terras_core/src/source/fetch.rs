//! Remote dataset download.

use crate::source::SourceError;
use log::{error, info};
use std::time::{Duration, Instant};

/// Whole-request timeout used by [`HttpFetcher::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads the raw bytes behind a URL.
///
/// Kept as a trait so the batch coordinator can run against a canned
/// response in tests.
pub trait RemoteFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let started_at = Instant::now();
        info!("event=source_fetch module=source status=start url={url}");

        let download_error = |err: reqwest::Error| {
            error!(
                "event=source_fetch module=source status=error url={} duration_ms={} error={}",
                url,
                started_at.elapsed().as_millis(),
                err
            );
            SourceError::Download {
                url: url.to_string(),
                source: Box::new(err),
            }
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("terras/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(download_error)?;

        let bytes = client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(|response| response.bytes())
            .map_err(download_error)?;

        info!(
            "event=source_fetch module=source status=ok url={} bytes={} duration_ms={}",
            url,
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(bytes.to_vec())
    }
}
