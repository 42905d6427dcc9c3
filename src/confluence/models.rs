//! Data transfer objects exchanged with the Confluence REST API.
//!
//! Only the fields the gateway inspects are modelled; everything else is
//! captured in a flattened map so responses round-trip to callers without
//! losing detail.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Confluence page metadata and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
  /// Unique numeric identifier assigned by Confluence.
  pub id: String,
  /// Human-readable title displayed in the UI.
  pub title: String,
  #[serde(rename = "type")]
  /// Content type (typically `"page"` or `"attachment"`).
  pub page_type: String,
  /// Publication status such as `"current"` or `"draft"`.
  pub status: String,
  /// Rich body content, present when `body.storage` was expanded.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub body: Option<PageBody>,
  /// Version record, present when `version` was expanded.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<PageVersion>,
  /// Space metadata describing where the page lives.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub space: Option<PageSpace>,
  /// Ancestor chain; the last entry is the direct parent.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ancestors: Option<Vec<PageAncestor>>,
  /// Remaining response fields, preserved verbatim for callers.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Page {
  /// The storage-format body, or an empty string when it was not expanded.
  pub fn storage_body(&self) -> &str {
    self
      .body
      .as_ref()
      .and_then(|body| body.storage.as_ref())
      .map_or("", |storage| storage.value.as_str())
  }

  /// The current version number, defaulting to 1 when not expanded.
  pub fn version_number(&self) -> i64 {
    self.version.as_ref().map_or(1, |version| version.number)
  }
}

/// Page body content wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBody {
  /// Confluence storage-format XHTML representation.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub storage: Option<StorageFormat>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Storage format (Confluence's internal XHTML-like format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFormat {
  /// Raw storage markup returned by the API.
  pub value: String,
  /// Representation name (always `"storage"` here).
  pub representation: String,
}

/// Page version record used for optimistic concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVersion {
  /// Monotonically increasing version number.
  pub number: i64,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Space information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSpace {
  /// Short key that uniquely identifies the space.
  pub key: String,
  /// Human-readable space name.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Reference to an ancestor page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageAncestor {
  /// Identifier of the ancestor page.
  pub id: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Attachment metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
  /// Unique attachment identifier.
  pub id: String,
  /// Original filename/title displayed in Confluence.
  pub title: String,
  #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
  /// MIME type reported by Confluence, when known.
  pub media_type: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Response wrapper for attachment uploads and listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentsResponse {
  /// Attachments included in the API response.
  pub results: Vec<Attachment>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A file staged for upload to Confluence.
#[derive(Debug, Clone)]
pub struct UploadFile {
  /// Filename under which the attachment is stored.
  pub name: String,
  /// MIME type sent in the multipart payload.
  pub mime_type: String,
  /// Raw file bytes.
  pub data: Vec<u8>,
}
