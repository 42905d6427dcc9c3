//! Trait definitions for interacting with Confluence.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::models::{AttachmentsResponse, Page, UploadFile};
use crate::error::GatewayError;

/// Trait for primitive Confluence API operations (enables testing with fake
/// implementations).
///
/// Each method maps to exactly one REST call. Backend HTTP errors propagate
/// unchanged in substance as [`GatewayError::Backend`]; no method retries or
/// reinterprets upstream failures.
#[async_trait]
pub trait ConfluenceApi: Send + Sync {
  /// List visible spaces, forwarding arbitrary query parameters such as
  /// `limit` and `start`.
  async fn get_spaces(&self, params: &Map<String, Value>) -> Result<Value, GatewayError>;

  /// Fetch a single space by key.
  async fn get_space(&self, space_key: &str) -> Result<Value, GatewayError>;

  /// Fetch the permission entries of a space.
  async fn get_space_permissions(&self, space_key: &str) -> Result<Value, GatewayError>;

  /// Fetch a content item by ID.
  ///
  /// # Arguments
  /// * `page_id` - Unique Confluence identifier for the content to retrieve.
  /// * `expand` - Response expansions such as `body.storage` or `version`.
  async fn get_content_by_id(&self, page_id: &str, expand: &[&str]) -> Result<Page, GatewayError>;

  /// Find content by space key and exact title, expanding body and version.
  async fn find_content(&self, space_key: &str, title: &str) -> Result<Value, GatewayError>;

  /// Run a CQL search.
  async fn search(&self, cql: &str, limit: u32) -> Result<Value, GatewayError>;

  /// Create a page. A present `parent_id` makes the new page a child of
  /// that page; absence makes it a space root page.
  async fn create_page(
    &self,
    space_key: &str,
    title: &str,
    body: &str,
    parent_id: Option<&str>,
  ) -> Result<Page, GatewayError>;

  /// Update a page's title and body.
  ///
  /// `version` is the version the caller last observed, not the desired
  /// next one; the transport increments it before sending. A stale value
  /// surfaces as a backend conflict error.
  async fn update_page(&self, page_id: &str, title: &str, body: &str, version: i64) -> Result<Page, GatewayError>;

  /// Re-parent a page. Same optimistic-concurrency contract as
  /// [`update_page`](Self::update_page).
  async fn move_page(&self, page_id: &str, new_parent_id: &str, version: i64) -> Result<Page, GatewayError>;

  /// List direct child pages.
  ///
  /// # Arguments
  /// * `expand` - Response expansions applied to each child.
  /// * `limit` - Maximum children returned, when bounded.
  async fn get_page_children(&self, page_id: &str, expand: &[&str], limit: Option<u32>)
  -> Result<Value, GatewayError>;

  /// List attachments of a page.
  async fn get_page_attachments(&self, page_id: &str) -> Result<Value, GatewayError>;

  /// Fetch a page's version history.
  async fn get_page_history(&self, page_id: &str, limit: u32) -> Result<Value, GatewayError>;

  /// Add global-prefix labels to a page.
  async fn add_page_labels(&self, page_id: &str, labels: &[String]) -> Result<Value, GatewayError>;

  /// Upload a new attachment to a page as a single multipart POST.
  async fn upload_attachment(
    &self,
    page_id: &str,
    file: &UploadFile,
    comment: Option<&str>,
  ) -> Result<AttachmentsResponse, GatewayError>;

  /// Replace the binary data of an existing attachment.
  async fn update_attachment(
    &self,
    page_id: &str,
    attachment_id: &str,
    file: &UploadFile,
    comment: Option<&str>,
  ) -> Result<Value, GatewayError>;

  /// Delete an attachment by content id.
  async fn delete_attachment(&self, attachment_id: &str) -> Result<Value, GatewayError>;

  /// List content of a given type within a space.
  async fn list_content(&self, space_key: &str, content_type: &str, limit: u32) -> Result<Value, GatewayError>;

  /// Create a page from the blueprint endpoint, labelled as a template.
  async fn create_template(
    &self,
    space_key: &str,
    name: &str,
    body: &str,
    description: Option<&str>,
  ) -> Result<Value, GatewayError>;
}
