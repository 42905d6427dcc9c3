//! HTTP client implementation for talking to the Confluence REST API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value, json};

use super::api::ConfluenceApi;
use super::models::{AttachmentsResponse, Page, UploadFile};
use crate::error::GatewayError;
use crate::registry::Credentials;

/// Confluence API client bound to one tenant's credentials.
#[derive(Clone)]
pub struct ConfluenceClient {
  base_url: String,
  auth_header: String,
  client: reqwest::Client,
}

impl ConfluenceClient {
  /// Create a new Confluence client.
  ///
  /// # Arguments
  /// * `credentials` - Resolved tenant credentials (base URL, principal,
  ///   API token).
  /// * `timeout_secs` - Request timeout in seconds applied to every call.
  ///
  /// # Errors
  /// Returns an error if the underlying `reqwest::Client` cannot be built.
  pub fn new(credentials: &Credentials, timeout_secs: u64) -> Result<Self, GatewayError> {
    let base_url = credentials.base_url.trim_end_matches('/').to_string();

    // Basic auth is derived once per client instance; every request reuses
    // the encoded header.
    let encoded = BASE64.encode(format!("{}:{}", credentials.username, credentials.api_token).as_bytes());
    let auth_header = format!("Basic {encoded}");

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .user_agent(format!(
        "confluence-gateway/{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("TARGET")
      ))
      .build()
      .map_err(|e| GatewayError::Backend {
        status: None,
        message: format!("failed to create HTTP client: {e}"),
      })?;

    Ok(Self {
      base_url,
      auth_header,
      client,
    })
  }

  fn api_url(&self, path: &str) -> String {
    format!("{}/rest/api{path}", self.base_url)
  }

  /// Send a prepared request and fail on any non-success status, passing
  /// the upstream status and body through unchanged in substance.
  async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
    let response = request
      .header("Authorization", &self.auth_header)
      .header("Accept", "application/json")
      .send()
      .await
      .map_err(|e| GatewayError::backend_transport(&e))?;

    let status = response.status();
    if !status.is_success() {
      let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(no error details)"));
      return Err(GatewayError::backend_status(status.as_u16(), error_text));
    }

    Ok(response)
  }

  async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    response.json().await.map_err(|e| GatewayError::Backend {
      status: None,
      message: format!("failed to parse Confluence API response: {e}"),
    })
  }

  async fn get_value(&self, url: String, query: &[(&str, String)]) -> Result<Value, GatewayError> {
    let response = self.execute(self.client.get(url).query(query)).await?;
    Self::decode(response).await
  }

  fn multipart_form(
    file: &UploadFile,
    comment: Option<&str>,
    minor_edit: bool,
  ) -> Result<reqwest::multipart::Form, GatewayError> {
    let part = reqwest::multipart::Part::bytes(file.data.clone())
      .file_name(file.name.clone())
      .mime_str(&file.mime_type)
      .map_err(|_| GatewayError::Validation(format!("invalid MIME type: {}", file.mime_type)))?;

    let mut form = reqwest::multipart::Form::new().part("file", part);
    if minor_edit {
      form = form.text("minorEdit", "true");
    }
    if let Some(comment) = comment {
      form = form.text("comment", comment.to_string());
    }
    Ok(form)
  }
}

/// Render a JSON parameter value as a flat query-string value.
fn query_value(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

#[async_trait]
impl ConfluenceApi for ConfluenceClient {
  async fn get_spaces(&self, params: &Map<String, Value>) -> Result<Value, GatewayError> {
    let query: Vec<(&str, String)> = params.iter().map(|(k, v)| (k.as_str(), query_value(v))).collect();
    self.get_value(self.api_url("/space"), &query).await
  }

  async fn get_space(&self, space_key: &str) -> Result<Value, GatewayError> {
    self.get_value(self.api_url(&format!("/space/{space_key}")), &[]).await
  }

  async fn get_space_permissions(&self, space_key: &str) -> Result<Value, GatewayError> {
    self
      .get_value(self.api_url(&format!("/space/{space_key}/permission")), &[])
      .await
  }

  async fn get_content_by_id(&self, page_id: &str, expand: &[&str]) -> Result<Page, GatewayError> {
    let mut query = Vec::new();
    if !expand.is_empty() {
      query.push(("expand", expand.join(",")));
    }

    let url = self.api_url(&format!("/content/{page_id}"));
    let response = self.execute(self.client.get(url).query(&query)).await?;
    Self::decode(response).await
  }

  async fn find_content(&self, space_key: &str, title: &str) -> Result<Value, GatewayError> {
    let query = [
      ("spaceKey", space_key.to_string()),
      ("title", title.to_string()),
      ("expand", String::from("body.storage,version")),
    ];
    self.get_value(self.api_url("/content"), &query).await
  }

  async fn search(&self, cql: &str, limit: u32) -> Result<Value, GatewayError> {
    let query = [("cql", cql.to_string()), ("limit", limit.to_string())];
    self.get_value(self.api_url("/search"), &query).await
  }

  async fn create_page(
    &self,
    space_key: &str,
    title: &str,
    body: &str,
    parent_id: Option<&str>,
  ) -> Result<Page, GatewayError> {
    let mut payload = json!({
      "type": "page",
      "title": title,
      "space": { "key": space_key },
      "body": {
        "storage": {
          "value": body,
          "representation": "storage",
        },
      },
    });
    if let Some(parent_id) = parent_id {
      payload["ancestors"] = json!([{ "id": parent_id }]);
    }

    let response = self.execute(self.client.post(self.api_url("/content")).json(&payload)).await?;
    Self::decode(response).await
  }

  async fn update_page(&self, page_id: &str, title: &str, body: &str, version: i64) -> Result<Page, GatewayError> {
    // Callers pass the version they last observed; the wire always carries
    // the successor.
    let payload = json!({
      "version": { "number": version + 1 },
      "title": title,
      "type": "page",
      "body": {
        "storage": {
          "value": body,
          "representation": "storage",
        },
      },
    });

    let url = self.api_url(&format!("/content/{page_id}"));
    let response = self.execute(self.client.put(url).json(&payload)).await?;
    Self::decode(response).await
  }

  async fn move_page(&self, page_id: &str, new_parent_id: &str, version: i64) -> Result<Page, GatewayError> {
    let payload = json!({
      "version": { "number": version + 1 },
      "ancestors": [{ "id": new_parent_id }],
    });

    let url = self.api_url(&format!("/content/{page_id}"));
    let response = self.execute(self.client.put(url).json(&payload)).await?;
    Self::decode(response).await
  }

  async fn get_page_children(
    &self,
    page_id: &str,
    expand: &[&str],
    limit: Option<u32>,
  ) -> Result<Value, GatewayError> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    if !expand.is_empty() {
      query.push(("expand", expand.join(",")));
    }

    self.get_value(self.api_url(&format!("/content/{page_id}/child/page")), &query).await
  }

  async fn get_page_attachments(&self, page_id: &str) -> Result<Value, GatewayError> {
    self
      .get_value(self.api_url(&format!("/content/{page_id}/child/attachment")), &[])
      .await
  }

  async fn get_page_history(&self, page_id: &str, limit: u32) -> Result<Value, GatewayError> {
    let query = [("limit", limit.to_string())];
    self
      .get_value(self.api_url(&format!("/content/{page_id}/history")), &query)
      .await
  }

  async fn add_page_labels(&self, page_id: &str, labels: &[String]) -> Result<Value, GatewayError> {
    let payload: Vec<Value> = labels
      .iter()
      .map(|label| json!({ "prefix": "global", "name": label }))
      .collect();

    let url = self.api_url(&format!("/content/{page_id}/label"));
    let response = self.execute(self.client.post(url).json(&payload)).await?;
    Self::decode(response).await
  }

  async fn upload_attachment(
    &self,
    page_id: &str,
    file: &UploadFile,
    comment: Option<&str>,
  ) -> Result<AttachmentsResponse, GatewayError> {
    let form = Self::multipart_form(file, comment, true)?;
    let url = self.api_url(&format!("/content/{page_id}/child/attachment"));

    let response = self
      .execute(self.client.post(url).header("X-Atlassian-Token", "no-check").multipart(form))
      .await?;
    Self::decode(response).await
  }

  async fn update_attachment(
    &self,
    page_id: &str,
    attachment_id: &str,
    file: &UploadFile,
    comment: Option<&str>,
  ) -> Result<Value, GatewayError> {
    let form = Self::multipart_form(file, comment, false)?;
    let url = self.api_url(&format!("/content/{page_id}/child/attachment/{attachment_id}/data"));

    let response = self
      .execute(self.client.post(url).header("X-Atlassian-Token", "no-check").multipart(form))
      .await?;
    Self::decode(response).await
  }

  async fn delete_attachment(&self, attachment_id: &str) -> Result<Value, GatewayError> {
    let url = self.api_url(&format!("/content/{attachment_id}"));
    let response = self.execute(self.client.delete(url)).await?;

    // Deletion returns 204 with an empty body; surface that as null rather
    // than a parse failure.
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_str(&text).or(Ok(Value::String(text)))
  }

  async fn list_content(&self, space_key: &str, content_type: &str, limit: u32) -> Result<Value, GatewayError> {
    let query = [
      ("spaceKey", space_key.to_string()),
      ("type", content_type.to_string()),
      ("limit", limit.to_string()),
    ];
    self.get_value(self.api_url("/content"), &query).await
  }

  async fn create_template(
    &self,
    space_key: &str,
    name: &str,
    body: &str,
    description: Option<&str>,
  ) -> Result<Value, GatewayError> {
    let mut payload = json!({
      "type": "page",
      "title": name,
      "space": { "key": space_key },
      "body": {
        "storage": {
          "value": body,
          "representation": "storage",
        },
      },
      "metadata": {
        "labels": [{ "prefix": "global", "name": "template" }],
      },
    });
    if let Some(description) = description {
      payload["description"] = json!({ "plain": { "value": description, "representation": "plain" } });
    }

    let response = self
      .execute(self.client.post(self.api_url("/content/blueprint/instance")).json(&payload))
      .await?;
    Self::decode(response).await
  }
}
