//! Fake remote-file store for testing upload-and-embed flows.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use confluence_gateway::content::{FetchedFile, RemoteFiles};
use confluence_gateway::error::GatewayError;

/// In-memory remote file store that records deletions.
#[derive(Default)]
pub struct FakeRemote {
  files: Mutex<HashMap<String, (Vec<u8>, Option<String>)>>,
  deleted: Mutex<Vec<String>>,
  fail_delete: Mutex<bool>,
}

impl FakeRemote {
  /// Create an empty store.
  pub fn new() -> Self {
    Self::default()
  }

  /// Stage a file at a URL.
  pub fn add_file(&self, url: &str, bytes: &[u8], content_type: Option<&str>) {
    self
      .files
      .lock()
      .unwrap()
      .insert(url.to_string(), (bytes.to_vec(), content_type.map(str::to_string)));
  }

  /// Make every delete call fail.
  pub fn fail_deletes(&self) {
    *self.fail_delete.lock().unwrap() = true;
  }

  /// URLs deleted so far.
  pub fn deleted(&self) -> Vec<String> {
    self.deleted.lock().unwrap().clone()
  }
}

#[async_trait]
impl RemoteFiles for &FakeRemote {
  async fn fetch(&self, url: &str) -> Result<FetchedFile, GatewayError> {
    let files = self.files.lock().unwrap();
    let (bytes, content_type) = files
      .get(url)
      .ok_or_else(|| GatewayError::Fetch(format!("failed to fetch file from URL: 404 Not Found ({url})")))?;
    Ok(FetchedFile {
      bytes: bytes.clone(),
      content_type: content_type.clone(),
    })
  }

  async fn delete(&self, url: &str) -> Result<(), GatewayError> {
    if *self.fail_delete.lock().unwrap() {
      return Err(GatewayError::Fetch(String::from("failed to delete staged blob: 503")));
    }
    self.deleted.lock().unwrap().push(url.to_string());
    Ok(())
  }
}
