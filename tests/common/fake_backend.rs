//! Fake Confluence API client for testing
//!
//! In-memory implementation of the Confluence API that emulates the
//! behaviors the engine depends on: storage bodies, version numbers with
//! optimistic-concurrency rejection, parent/child relationships, and
//! attachment uploads.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use confluence_gateway::confluence::{
  Attachment, AttachmentsResponse, ConfluenceApi, Page, PageAncestor, PageBody, PageVersion, StorageFormat,
  UploadFile,
};
use confluence_gateway::error::GatewayError;
use serde_json::{Map, Value, json};

/// One stored page.
#[derive(Debug, Clone)]
pub struct StoredPage {
  pub title: String,
  pub body: String,
  pub version: i64,
  pub space_key: String,
  pub parent_id: Option<String>,
}

#[derive(Default)]
struct State {
  pages: HashMap<String, StoredPage>,
  labels: HashMap<String, Vec<String>>,
  searches: Vec<String>,
  uploads: Vec<(String, String)>,
  next_id: u64,
  update_count: usize,
  upload_without_id: bool,
}

/// A fake Confluence client backed by an in-memory page store.
#[derive(Default)]
pub struct FakeBackend {
  state: Mutex<State>,
}

impl FakeBackend {
  /// Create an empty fake backend.
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed a page and return its id.
  pub fn add_page(&self, title: &str, body: &str) -> String {
    self.add_page_in_space(title, body, "DOCS")
  }

  /// Seed a page in a specific space and return its id.
  pub fn add_page_in_space(&self, title: &str, body: &str, space_key: &str) -> String {
    let mut state = self.state.lock().unwrap();
    state.next_id += 1;
    let id = format!("{}", 1000 + state.next_id);
    state.pages.insert(
      id.clone(),
      StoredPage {
        title: title.to_string(),
        body: body.to_string(),
        version: 1,
        space_key: space_key.to_string(),
        parent_id: None,
      },
    );
    id
  }

  /// Make every upload response come back without an attachment id.
  pub fn fail_uploads_without_id(&self) {
    self.state.lock().unwrap().upload_without_id = true;
  }

  /// Snapshot of a stored page.
  pub fn page(&self, page_id: &str) -> StoredPage {
    self.state.lock().unwrap().pages.get(page_id).cloned().expect("page should exist")
  }

  /// Number of page writes (updates and moves) performed so far.
  pub fn update_count(&self) -> usize {
    self.state.lock().unwrap().update_count
  }

  /// CQL queries issued through `search`.
  pub fn searches(&self) -> Vec<String> {
    self.state.lock().unwrap().searches.clone()
  }

  /// Files uploaded so far as `(page_id, filename)` pairs.
  pub fn uploads(&self) -> Vec<(String, String)> {
    self.state.lock().unwrap().uploads.clone()
  }

  /// Labels recorded for a page.
  pub fn labels(&self, page_id: &str) -> Vec<String> {
    self.state.lock().unwrap().labels.get(page_id).cloned().unwrap_or_default()
  }

  fn to_page(id: &str, stored: &StoredPage) -> Page {
    Page {
      id: id.to_string(),
      title: stored.title.clone(),
      page_type: String::from("page"),
      status: String::from("current"),
      body: Some(PageBody {
        storage: Some(StorageFormat {
          value: stored.body.clone(),
          representation: String::from("storage"),
        }),
        extra: Map::new(),
      }),
      version: Some(PageVersion {
        number: stored.version,
        extra: Map::new(),
      }),
      space: None,
      ancestors: stored.parent_id.as_ref().map(|parent| {
        vec![PageAncestor {
          id: parent.clone(),
          extra: Map::new(),
        }]
      }),
      extra: Map::new(),
    }
  }

  fn missing(page_id: &str) -> GatewayError {
    GatewayError::backend_status(404, format!("No content found with id: {page_id}"))
  }
}

#[async_trait]
impl ConfluenceApi for FakeBackend {
  async fn get_spaces(&self, _params: &Map<String, Value>) -> Result<Value, GatewayError> {
    Ok(json!({ "results": [] }))
  }

  async fn get_space(&self, space_key: &str) -> Result<Value, GatewayError> {
    Ok(json!({ "key": space_key, "name": "Fake Space" }))
  }

  async fn get_space_permissions(&self, space_key: &str) -> Result<Value, GatewayError> {
    Ok(json!({ "space": space_key, "permissions": [] }))
  }

  async fn get_content_by_id(&self, page_id: &str, _expand: &[&str]) -> Result<Page, GatewayError> {
    let state = self.state.lock().unwrap();
    let stored = state.pages.get(page_id).ok_or_else(|| Self::missing(page_id))?;
    Ok(Self::to_page(page_id, stored))
  }

  async fn find_content(&self, space_key: &str, title: &str) -> Result<Value, GatewayError> {
    let state = self.state.lock().unwrap();
    let results: Vec<Value> = state
      .pages
      .iter()
      .filter(|(_, stored)| stored.space_key == space_key && stored.title == title)
      .map(|(id, stored)| serde_json::to_value(Self::to_page(id, stored)).unwrap())
      .collect();
    Ok(json!({ "results": results, "size": results.len() }))
  }

  async fn search(&self, cql: &str, _limit: u32) -> Result<Value, GatewayError> {
    self.state.lock().unwrap().searches.push(cql.to_string());
    Ok(json!({ "results": [] }))
  }

  async fn create_page(
    &self,
    space_key: &str,
    title: &str,
    body: &str,
    parent_id: Option<&str>,
  ) -> Result<Page, GatewayError> {
    let mut state = self.state.lock().unwrap();
    state.next_id += 1;
    let id = format!("{}", 1000 + state.next_id);
    let stored = StoredPage {
      title: title.to_string(),
      body: body.to_string(),
      version: 1,
      space_key: space_key.to_string(),
      parent_id: parent_id.map(str::to_string),
    };
    let page = Self::to_page(&id, &stored);
    state.pages.insert(id, stored);
    Ok(page)
  }

  async fn update_page(&self, page_id: &str, title: &str, body: &str, version: i64) -> Result<Page, GatewayError> {
    let mut state = self.state.lock().unwrap();
    let stored = state.pages.get_mut(page_id).ok_or_else(|| Self::missing(page_id))?;

    if version != stored.version {
      return Err(GatewayError::backend_status(
        409,
        format!("version conflict: expected {}, got {version}", stored.version),
      ));
    }

    stored.title = title.to_string();
    stored.body = body.to_string();
    stored.version = version + 1;
    let page = Self::to_page(page_id, stored);
    state.update_count += 1;
    Ok(page)
  }

  async fn move_page(&self, page_id: &str, new_parent_id: &str, version: i64) -> Result<Page, GatewayError> {
    let mut state = self.state.lock().unwrap();
    let stored = state.pages.get_mut(page_id).ok_or_else(|| Self::missing(page_id))?;

    if version != stored.version {
      return Err(GatewayError::backend_status(
        409,
        format!("version conflict: expected {}, got {version}", stored.version),
      ));
    }

    stored.parent_id = Some(new_parent_id.to_string());
    stored.version = version + 1;
    let page = Self::to_page(page_id, stored);
    state.update_count += 1;
    Ok(page)
  }

  async fn get_page_children(
    &self,
    page_id: &str,
    _expand: &[&str],
    _limit: Option<u32>,
  ) -> Result<Value, GatewayError> {
    let state = self.state.lock().unwrap();
    let results: Vec<Value> = state
      .pages
      .iter()
      .filter(|(_, stored)| stored.parent_id.as_deref() == Some(page_id))
      .map(|(id, stored)| serde_json::to_value(Self::to_page(id, stored)).unwrap())
      .collect();
    Ok(json!({ "results": results }))
  }

  async fn get_page_attachments(&self, _page_id: &str) -> Result<Value, GatewayError> {
    Ok(json!({ "results": [] }))
  }

  async fn get_page_history(&self, page_id: &str, _limit: u32) -> Result<Value, GatewayError> {
    let state = self.state.lock().unwrap();
    let stored = state.pages.get(page_id).ok_or_else(|| Self::missing(page_id))?;
    Ok(json!({ "latest": { "number": stored.version } }))
  }

  async fn add_page_labels(&self, page_id: &str, labels: &[String]) -> Result<Value, GatewayError> {
    let mut state = self.state.lock().unwrap();
    state.labels.entry(page_id.to_string()).or_default().extend(labels.iter().cloned());
    Ok(json!({ "results": labels }))
  }

  async fn upload_attachment(
    &self,
    page_id: &str,
    file: &UploadFile,
    _comment: Option<&str>,
  ) -> Result<AttachmentsResponse, GatewayError> {
    let mut state = self.state.lock().unwrap();
    if state.upload_without_id {
      return Ok(AttachmentsResponse {
        results: Vec::new(),
        extra: Map::new(),
      });
    }

    state.next_id += 1;
    let id = format!("att{}", state.next_id);
    state.uploads.push((page_id.to_string(), file.name.clone()));
    Ok(AttachmentsResponse {
      results: vec![Attachment {
        id,
        title: file.name.clone(),
        media_type: Some(file.mime_type.clone()),
        extra: Map::new(),
      }],
      extra: Map::new(),
    })
  }

  async fn update_attachment(
    &self,
    _page_id: &str,
    attachment_id: &str,
    file: &UploadFile,
    _comment: Option<&str>,
  ) -> Result<Value, GatewayError> {
    Ok(json!({ "id": attachment_id, "title": file.name }))
  }

  async fn delete_attachment(&self, _attachment_id: &str) -> Result<Value, GatewayError> {
    Ok(Value::Null)
  }

  async fn list_content(&self, space_key: &str, content_type: &str, _limit: u32) -> Result<Value, GatewayError> {
    Ok(json!({ "results": [], "spaceKey": space_key, "type": content_type }))
  }

  async fn create_template(
    &self,
    space_key: &str,
    name: &str,
    body: &str,
    description: Option<&str>,
  ) -> Result<Value, GatewayError> {
    let mut state = self.state.lock().unwrap();
    state.next_id += 1;
    let id = format!("{}", 1000 + state.next_id);
    state.pages.insert(
      id.clone(),
      StoredPage {
        title: name.to_string(),
        body: body.to_string(),
        version: 1,
        space_key: space_key.to_string(),
        parent_id: None,
      },
    );
    state.labels.entry(id.clone()).or_default().push(String::from("template"));
    Ok(json!({ "id": id, "title": name, "description": description }))
  }
}
