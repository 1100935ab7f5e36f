//! Where update candidates come from.
//!
//! `UpdateSource` is the seam between the checker and the network. The
//! production implementation is a plain HTTP GET; tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use schoolhouse_core::config::UpdateConfig;

use crate::digest::ContentDigest;
use crate::error::UpdateError;

/// A location publishing the current artifact.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> &str;

    /// Fetch the full published artifact.
    ///
    /// Any transport or protocol failure is `UpdateError::NetworkUnavailable`.
    async fn fetch(&self) -> Result<Vec<u8>, UpdateError>;

    /// Fetch the trusted digest of the published artifact, if the source
    /// publishes one.
    async fn fetch_checksum(&self) -> Result<Option<ContentDigest>, UpdateError> {
        Ok(None)
    }
}

/// Fetches candidates over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    checksum_url: Option<String>,
}

impl HttpSource {
    pub fn new(
        url: impl Into<String>,
        checksum_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("schoolhouse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpdateError::NetworkUnavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            checksum_url,
        })
    }

    pub fn from_config(config: &UpdateConfig) -> Result<Self, UpdateError> {
        Self::new(
            config.url.clone(),
            config.checksum_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, UpdateError> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::NetworkUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| UpdateError::NetworkUnavailable(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| UpdateError::NetworkUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl UpdateSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<u8>, UpdateError> {
        let bytes = self.get_bytes(&self.url).await?;
        tracing::debug!(url = %self.url, bytes = bytes.len(), "Fetched remote artifact");
        Ok(bytes)
    }

    async fn fetch_checksum(&self) -> Result<Option<ContentDigest>, UpdateError> {
        let Some(url) = self.checksum_url.as_deref() else {
            return Ok(None);
        };
        let bytes = self.get_bytes(url).await?;
        parse_checksum_manifest(&String::from_utf8_lossy(&bytes)).map(Some)
    }
}

/// Parse `sha256sum` output: the first token of the first non-blank line.
pub fn parse_checksum_manifest(text: &str) -> Result<ContentDigest, UpdateError> {
    let token = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.split_whitespace().next())
        .ok_or_else(|| UpdateError::RemoteContentInvalid("checksum manifest is empty".into()))?;

    ContentDigest::from_hex(token).ok_or_else(|| {
        UpdateError::RemoteContentInvalid(format!("malformed checksum {:?}", token))
    })
}
