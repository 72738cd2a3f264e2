//! Fetching image bytes over HTTP.
//!
//! The network is behind a trait so the worker pool can be exercised in
//! tests with an instrumented stub instead of a live server.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Transport or status failure while fetching one item.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// A blocking-style GET returning the full response body.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher over a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher. `timeout` bounds the whole request including the
    /// body read; with `None` a hanging server can occupy a worker
    /// indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_builds_with_and_without_timeout() {
        assert!(HttpFetcher::new(None).is_ok());
        assert!(HttpFetcher::new(Some(Duration::from_secs(30))).is_ok());
    }

    #[test]
    fn test_status_error_names_the_url() {
        let err = FetchError::Status {
            url: "http://a.test/x".into(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("http://a.test/x"));
    }
}
