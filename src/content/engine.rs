//! Composite content operations built on the primitive Confluence API.
//!
//! Every operation here follows the same read → transform → write pattern
//! against a single page body: fetch the current body and version, rewrite
//! the markup, and persist with the version that was fetched. Concurrency
//! control stays delegated to Confluence's optimistic version check; a
//! stale version surfaces as a backend conflict, never a retry.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::RemoteFiles;
use super::storage::{self, Position};
use crate::confluence::{ConfluenceApi, Page, UploadFile};
use crate::error::GatewayError;

/// Placeholder body given to pages that act as folders.
pub const FOLDER_BODY: &str = "<p>This is a folder page.</p>";

/// Label marking a page as a reusable template.
pub const TEMPLATE_LABEL: &str = "template";

/// Default display width for embedded images.
pub const DEFAULT_IMAGE_WIDTH: u32 = 800;

/// Source of the bytes for an upload-and-embed operation.
#[derive(Debug, Clone)]
pub enum UploadSource {
  /// Bytes supplied inline, base64-encoded.
  Inline {
    /// Filename under which to store the attachment.
    name: String,
    /// Base64-encoded file content.
    data: String,
    /// MIME type of the content.
    mime_type: String,
  },
  /// Bytes staged at a remote URL, fetched before upload.
  Url {
    /// Location to fetch.
    url: String,
    /// Filename override; defaults to `document.png`.
    filename: Option<String>,
  },
}

/// Optional knobs for upload-and-embed.
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
  /// Attachment comment recorded on upload.
  pub comment: Option<String>,
  /// Display width; defaults to [`DEFAULT_IMAGE_WIDTH`].
  pub width: Option<u32>,
  /// Placement; defaults to centered for uploads.
  pub position: Option<Position>,
}

/// Composite operations over page bodies.
pub struct ContentEngine<A, R> {
  api: A,
  remote: R,
  staging_host: Option<String>,
}

impl<A: ConfluenceApi, R: RemoteFiles> ContentEngine<A, R> {
  /// Create an engine over a backend client and a remote-file client.
  ///
  /// # Arguments
  /// * `staging_host` - Host of the upload-staging object store; blobs
  ///   fetched from this host are deleted once an upload-and-embed cycle
  ///   finishes.
  pub fn new(api: A, remote: R, staging_host: Option<String>) -> Self {
    Self {
      api,
      remote,
      staging_host,
    }
  }

  /// The underlying primitive API client.
  pub fn api(&self) -> &A {
    &self.api
  }

  /// Fetch the pieces needed for a read-modify-write cycle.
  async fn page_for_edit(&self, page_id: &str) -> Result<Page, GatewayError> {
    self.api.get_content_by_id(page_id, &["body.storage", "version"]).await
  }

  /// Append markup to a page body and persist with the fetched version.
  async fn append_to_page(&self, page_id: &str, markup: &str, separator: &str) -> Result<Page, GatewayError> {
    let page = self.page_for_edit(page_id).await?;
    let new_body = format!("{}{separator}{markup}", page.storage_body());
    self
      .api
      .update_page(page_id, &page.title, &new_body, page.version_number())
      .await
  }

  /// Append a structured macro to the end of a page.
  ///
  /// The macro always lands at the end of the body; positional insertion is
  /// not supported.
  pub async fn insert_macro(
    &self,
    page_id: &str,
    macro_name: &str,
    parameters: &Map<String, Value>,
    body: Option<&str>,
  ) -> Result<Page, GatewayError> {
    info!(page_id, macro_name, "inserting macro");
    let markup = storage::macro_markup(macro_name, parameters, body);
    self.append_to_page(page_id, &markup, "").await
  }

  /// Replace every instance of one macro with a freshly built self-closing
  /// macro of another name.
  ///
  /// When the page contains no instance of `old_name` the page is left
  /// untouched (no write is issued) and the fetched page is returned.
  pub async fn update_macro(
    &self,
    page_id: &str,
    old_name: &str,
    new_name: &str,
    parameters: &Map<String, Value>,
  ) -> Result<Page, GatewayError> {
    let page = self.page_for_edit(page_id).await?;
    let replacement = storage::macro_markup(new_name, parameters, None);
    let (new_body, replaced) = storage::replace_macros(page.storage_body(), old_name, &replacement);

    if replaced == 0 {
      debug!(page_id, old_name, "no macro instances to update");
      return Ok(page);
    }

    info!(page_id, old_name, new_name, replaced, "updating macros");
    self
      .api
      .update_page(page_id, &page.title, &new_body, page.version_number())
      .await
  }

  /// Enumerate the macros present on a page with their byte offsets.
  ///
  /// This is a flat index sufficient for enumeration, not a structural
  /// parse; nested macros appear as separate entries.
  pub async fn get_page_macros(&self, page_id: &str) -> Result<Value, GatewayError> {
    let page = self.api.get_content_by_id(page_id, &["body.storage"]).await?;
    let macros: Vec<Value> = storage::scan_macros(page.storage_body())
      .iter()
      .map(|span| json!({ "name": span.name, "position": span.start }))
      .collect();

    Ok(json!({ "count": macros.len(), "macros": macros }))
  }

  /// Embed an already-uploaded attachment as an image on a page.
  ///
  /// The reference is written by filename, not attachment id; Confluence
  /// resolves images by filename at render time.
  pub async fn embed_existing_attachment(
    &self,
    page_id: &str,
    attachment_id: &str,
    attachment_name: &str,
    width: u32,
    position: Position,
  ) -> Result<Page, GatewayError> {
    debug!(page_id, attachment_id, attachment_name, "embedding attachment by filename");
    let markup = storage::positioned(&storage::image_markup(attachment_name, width), position);
    self.append_to_page(page_id, &markup, "\n\n").await
  }

  /// Upload a file and embed it on the page in one step.
  ///
  /// Bytes arrive inline (base64) or from a remote URL. When the URL points
  /// at the configured staging host, the staged blob is deleted after the
  /// embed, and on every failure path past the fetch, without ever
  /// overriding the primary outcome.
  pub async fn upload_and_embed(
    &self,
    page_id: &str,
    source: UploadSource,
    options: EmbedOptions,
  ) -> Result<Value, GatewayError> {
    let (file, staged_url) = match source {
      UploadSource::Inline { name, data, mime_type } => {
        let data = BASE64
          .decode(data.as_bytes())
          .map_err(|e| GatewayError::Validation(format!("file data is not valid base64: {e}")))?;
        (
          UploadFile {
            name,
            mime_type,
            data,
          },
          None,
        )
      }
      UploadSource::Url { url, filename } => {
        let fetched = self.remote.fetch(&url).await?;
        let file = UploadFile {
          name: filename.unwrap_or_else(|| String::from("document.png")),
          mime_type: fetched
            .content_type
            .unwrap_or_else(|| String::from("application/octet-stream")),
          data: fetched.bytes,
        };
        let staged = self.is_staged(&url).then_some(url);
        (file, staged)
      }
    };

    let result = self.upload_then_embed(page_id, &file, &options).await;

    if let Some(url) = staged_url {
      self.cleanup_staged(&url).await;
    }

    result
  }

  async fn upload_then_embed(
    &self,
    page_id: &str,
    file: &UploadFile,
    options: &EmbedOptions,
  ) -> Result<Value, GatewayError> {
    let upload = self.api.upload_attachment(page_id, file, options.comment.as_deref()).await?;

    let attachment_id = upload
      .results
      .first()
      .map(|attachment| attachment.id.clone())
      .ok_or_else(|| GatewayError::Upload(String::from("Upload succeeded but no attachment ID returned")))?;

    self
      .embed_existing_attachment(
        page_id,
        &attachment_id,
        &file.name,
        options.width.unwrap_or(DEFAULT_IMAGE_WIDTH),
        options.position.unwrap_or(Position::Center),
      )
      .await?;

    Ok(json!({
      "success": true,
      "attachmentId": attachment_id,
      "filename": file.name,
      "message": format!("Successfully uploaded and embedded {}", file.name),
    }))
  }

  fn is_staged(&self, url: &str) -> bool {
    let Some(staging_host) = &self.staging_host else {
      return false;
    };
    Url::parse(url)
      .ok()
      .and_then(|parsed| parsed.host_str().map(|host| host == staging_host))
      .unwrap_or(false)
  }

  /// Best-effort staged-blob deletion; failures are logged, never
  /// propagated, so the primary outcome is preserved.
  async fn cleanup_staged(&self, url: &str) {
    if let Err(err) = self.remote.delete(url).await {
      warn!(url, "staged blob cleanup failed: {err}");
    }
  }

  /// Create a folder: a page with a fixed placeholder body.
  pub async fn create_folder(
    &self,
    space_key: &str,
    title: &str,
    parent_id: Option<&str>,
  ) -> Result<Page, GatewayError> {
    self.api.create_page(space_key, title, FOLDER_BODY, parent_id).await
  }

  /// List a folder's contents: its direct child pages.
  pub async fn get_folder_contents(&self, page_id: &str, expand: Option<Vec<String>>) -> Result<Value, GatewayError> {
    let expand = expand.unwrap_or_else(|| vec![String::from("version"), String::from("body.storage")]);
    let expand_refs: Vec<&str> = expand.iter().map(String::as_str).collect();
    self.api.get_page_children(page_id, &expand_refs, Some(100)).await
  }

  /// Re-parent a page under a folder. Same optimistic-concurrency contract
  /// as any page update.
  pub async fn move_page_to_folder(
    &self,
    page_id: &str,
    new_parent_id: &str,
    current_version: i64,
  ) -> Result<Page, GatewayError> {
    self.api.move_page(page_id, new_parent_id, current_version).await
  }

  /// Create a reusable page template: a page carrying the template label.
  pub async fn create_page_template(
    &self,
    space_key: &str,
    name: &str,
    content: &str,
    description: Option<&str>,
  ) -> Result<Value, GatewayError> {
    self.api.create_template(space_key, name, content, description).await
  }

  /// List the templates of a space via a label-filtered CQL search.
  pub async fn get_page_templates(&self, space_key: &str) -> Result<Value, GatewayError> {
    let cql = format!("space = \"{space_key}\" AND label = \"{TEMPLATE_LABEL}\"");
    self.api.search(&cql, 50).await
  }

  /// Create a new page whose initial body is a template's body.
  pub async fn apply_page_template(
    &self,
    template_id: &str,
    space_key: &str,
    title: &str,
    parent_id: Option<&str>,
  ) -> Result<Page, GatewayError> {
    let template = self.api.get_content_by_id(template_id, &["body.storage"]).await?;
    self
      .api
      .create_page(space_key, title, template.storage_body(), parent_id)
      .await
  }

  /// Update a template's name and body: a page update by another name.
  pub async fn update_page_template(
    &self,
    template_id: &str,
    name: &str,
    content: &str,
    version: i64,
  ) -> Result<Page, GatewayError> {
    self.api.update_page(template_id, name, content, version).await
  }

  /// List pages of a space carrying a given label.
  pub async fn get_pages_by_label(&self, space_key: &str, label: &str, limit: u32) -> Result<Value, GatewayError> {
    let cql = format!("space = \"{space_key}\" AND label = \"{label}\"");
    self.api.search(&cql, limit).await
  }

  /// Append a hyperlink paragraph pointing at an issue in the configured
  /// tracker.
  pub async fn link_page_to_issue(
    &self,
    page_id: &str,
    issue_key: &str,
    tracker_base_url: &str,
  ) -> Result<Page, GatewayError> {
    let markup = storage::issue_link_markup(tracker_base_url, issue_key);
    self.append_to_page(page_id, &markup, "").await
  }

  /// Append a Jira macro configured with a JQL query.
  pub async fn insert_jira_macro(
    &self,
    page_id: &str,
    jql_query: &str,
    display_options: &Map<String, Value>,
  ) -> Result<Page, GatewayError> {
    let mut parameters = display_options.clone();
    parameters.insert(String::from("jqlQuery"), Value::String(jql_query.to_string()));
    self.insert_macro(page_id, "jira", &parameters, None).await
  }
}
