//! Remote file retrieval and staged-blob cleanup.
//!
//! Upload-and-embed accepts a remote URL instead of inline bytes; the
//! [`RemoteFiles`] trait covers fetching that URL and deleting a staged
//! blob afterwards, so tests can run against an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;

/// A file retrieved from a remote URL.
#[derive(Debug, Clone)]
pub struct FetchedFile {
  /// Raw response bytes.
  pub bytes: Vec<u8>,
  /// The response's `Content-Type` header, when present.
  pub content_type: Option<String>,
}

/// Access to remote files referenced by URL.
#[async_trait]
pub trait RemoteFiles: Send + Sync {
  /// Fetch a file over HTTP.
  ///
  /// # Errors
  /// Returns `GatewayError::Fetch` on any transport failure or non-success
  /// status.
  async fn fetch(&self, url: &str) -> Result<FetchedFile, GatewayError>;

  /// Delete a staged blob. Callers treat failures as best-effort cleanup.
  async fn delete(&self, url: &str) -> Result<(), GatewayError>;
}

/// Production implementation backed by a plain (unauthenticated) HTTP
/// client.
#[derive(Clone)]
pub struct HttpRemoteFiles {
  client: reqwest::Client,
}

impl HttpRemoteFiles {
  /// Create a remote-file client with the given request timeout.
  ///
  /// # Errors
  /// Returns an error if the underlying `reqwest::Client` cannot be built.
  pub fn new(timeout_secs: u64) -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .user_agent(format!(
        "confluence-gateway/{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("TARGET")
      ))
      .build()
      .map_err(|e| GatewayError::Fetch(format!("failed to create file fetch client: {e}")))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl RemoteFiles for HttpRemoteFiles {
  async fn fetch(&self, url: &str) -> Result<FetchedFile, GatewayError> {
    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| GatewayError::Fetch(format!("failed to fetch file from URL: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      return Err(GatewayError::Fetch(format!("failed to fetch file from URL: {status}")));
    }

    let content_type = response
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|value| value.to_str().ok())
      .map(str::to_string);

    let bytes = response
      .bytes()
      .await
      .map_err(|e| GatewayError::Fetch(format!("failed to read file bytes: {e}")))?;

    Ok(FetchedFile {
      bytes: bytes.to_vec(),
      content_type,
    })
  }

  async fn delete(&self, url: &str) -> Result<(), GatewayError> {
    let response = self
      .client
      .delete(url)
      .send()
      .await
      .map_err(|e| GatewayError::Fetch(format!("failed to delete staged blob: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      return Err(GatewayError::Fetch(format!("failed to delete staged blob: {status}")));
    }

    Ok(())
  }
}
