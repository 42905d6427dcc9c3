//! Credential resolution against the project registry.
//!
//! Every tool call carries an opaque project API key. The registry is the
//! single source of truth for what that key maps to: the gateway asks it on
//! every request (no caching, so revocation takes effect on the next call)
//! and normalizes the returned Confluence configuration block into a
//! [`Credentials`] record.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Resolved per-tenant Confluence credentials.
///
/// Immutable once resolved; lives for a single inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  /// Base URL of the tenant's Confluence instance.
  pub base_url: String,
  /// The user's email address (Atlassian Cloud principal).
  pub username: String,
  /// The API token paired with the username.
  pub api_token: String,
  /// Space key applied when a tool call omits one.
  pub default_space_key: Option<String>,
  /// Issue-tracker base URL for Jira link operations, when the tenant
  /// configured one.
  pub issue_tracker_base_url: Option<String>,
}

/// One canonical credential field and the aliases the registry may use for
/// it. Aliases are tried in order; the first non-empty match wins.
struct FieldAliases {
  label: &'static str,
  aliases: &'static [&'static str],
}

const URL_FIELD: FieldAliases = FieldAliases {
  label: "URL",
  aliases: &["baseUrl", "url", "host"],
};

const USERNAME_FIELD: FieldAliases = FieldAliases {
  label: "username",
  aliases: &["email", "username", "user"],
};

const TOKEN_FIELD: FieldAliases = FieldAliases {
  label: "API token",
  aliases: &["apiToken", "token"],
};

const SPACE_FIELD: FieldAliases = FieldAliases {
  label: "space key",
  aliases: &["spaceKey", "space"],
};

const TRACKER_FIELD: FieldAliases = FieldAliases {
  label: "issue tracker URL",
  aliases: &["issueTrackerBaseUrl", "jiraBaseUrl", "jiraUrl"],
};

/// Client for the external project registry service.
pub struct RegistryClient {
  base_url: String,
  auth_token: Option<String>,
  client: reqwest::Client,
}

impl RegistryClient {
  /// Create a registry client from the gateway configuration.
  ///
  /// # Errors
  /// Returns an error if the underlying `reqwest::Client` cannot be built.
  pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.backend_timeout_secs))
      .user_agent(format!(
        "confluence-gateway/{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("TARGET")
      ))
      .build()
      .map_err(|e| GatewayError::Backend {
        status: None,
        message: format!("failed to create registry HTTP client: {e}"),
      })?;

    Ok(Self {
      base_url: config.registry_base_url.trim_end_matches('/').to_string(),
      auth_token: config.registry_auth_token.clone(),
      client,
    })
  }

  /// Resolve an opaque project API key into Confluence credentials.
  ///
  /// # Arguments
  /// * `api_key` - The key supplied by the caller on this request.
  ///
  /// # Errors
  /// * `Auth` when the registry rejects the key (any non-success status).
  /// * `Configuration` when the project exists but its Confluence block is
  ///   missing or incomplete.
  /// * `Backend` when the registry itself is unreachable.
  pub async fn resolve(&self, api_key: &str) -> Result<Credentials, GatewayError> {
    let url = format!("{}/api/project", self.base_url);

    let mut request = self.client.get(&url).query(&[("apiKey", api_key)]);
    if let Some(token) = &self.auth_token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(|e| GatewayError::Backend {
      status: None,
      message: format!("project registry request failed: {e}"),
    })?;

    if !response.status().is_success() {
      debug!(status = %response.status(), "registry rejected API key");
      return Err(GatewayError::Auth(String::from("Invalid API key or project not found")));
    }

    let payload: Value = response.json().await.map_err(|e| GatewayError::Backend {
      status: None,
      message: format!("failed to parse project registry response: {e}"),
    })?;

    credentials_from_project(&payload)
  }
}

/// Normalize a registry project payload into a credential record.
///
/// Expects `{ project: { configs: { confluence: { ... } } } }` and applies
/// the field alias table to the inner block.
pub fn credentials_from_project(payload: &Value) -> Result<Credentials, GatewayError> {
  let config = payload
    .pointer("/project/configs/confluence")
    .and_then(Value::as_object)
    .ok_or_else(|| GatewayError::Configuration(String::from("Confluence not configured for this project")))?;

  let base_url = required_field(config, &URL_FIELD)?;
  let username = required_field(config, &USERNAME_FIELD)?;
  let api_token = required_field(config, &TOKEN_FIELD)?;

  Ok(Credentials {
    base_url,
    username,
    api_token,
    default_space_key: optional_field(config, &SPACE_FIELD),
    issue_tracker_base_url: optional_field(config, &TRACKER_FIELD),
  })
}

/// Look up a field through its alias list, treating empty strings as absent.
fn optional_field(config: &serde_json::Map<String, Value>, field: &FieldAliases) -> Option<String> {
  field
    .aliases
    .iter()
    .find_map(|alias| config.get(*alias).and_then(Value::as_str))
    .filter(|value| !value.trim().is_empty())
    .map(str::to_string)
}

fn required_field(config: &serde_json::Map<String, Value>, field: &FieldAliases) -> Result<String, GatewayError> {
  optional_field(config, field).ok_or_else(|| {
    GatewayError::Configuration(format!(
      "Confluence {} not configured (expected one of: {})",
      field.label,
      field.aliases.join(", ")
    ))
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn project(confluence: Value) -> Value {
    json!({ "project": { "configs": { "confluence": confluence } } })
  }

  #[test]
  fn resolves_canonical_field_names() {
    let payload = project(json!({
      "baseUrl": "https://example.atlassian.net",
      "email": "user@example.com",
      "apiToken": "secret",
      "spaceKey": "DOCS",
    }));

    let credentials = credentials_from_project(&payload).unwrap();
    assert_eq!(credentials.base_url, "https://example.atlassian.net");
    assert_eq!(credentials.username, "user@example.com");
    assert_eq!(credentials.api_token, "secret");
    assert_eq!(credentials.default_space_key.as_deref(), Some("DOCS"));
    assert_eq!(credentials.issue_tracker_base_url, None);
  }

  #[test]
  fn resolves_alias_field_names() {
    let payload = project(json!({
      "url": "https://wiki.example.com",
      "user": "svc-account",
      "token": "secret",
      "space": "OPS",
      "jiraUrl": "https://issues.example.com",
    }));

    let credentials = credentials_from_project(&payload).unwrap();
    assert_eq!(credentials.base_url, "https://wiki.example.com");
    assert_eq!(credentials.username, "svc-account");
    assert_eq!(credentials.default_space_key.as_deref(), Some("OPS"));
    assert_eq!(
      credentials.issue_tracker_base_url.as_deref(),
      Some("https://issues.example.com")
    );
  }

  #[test]
  fn earlier_aliases_take_precedence() {
    let payload = project(json!({
      "baseUrl": "https://primary.example.com",
      "url": "https://secondary.example.com",
      "email": "first@example.com",
      "username": "second",
      "apiToken": "secret",
    }));

    let credentials = credentials_from_project(&payload).unwrap();
    assert_eq!(credentials.base_url, "https://primary.example.com");
    assert_eq!(credentials.username, "first@example.com");
  }

  #[test]
  fn missing_confluence_block_is_a_configuration_error() {
    let payload = json!({ "project": { "configs": {} } });
    let err = credentials_from_project(&payload).unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
    assert!(err.to_string().contains("not configured for this project"));
  }

  #[test]
  fn missing_url_names_the_accepted_aliases() {
    let payload = project(json!({
      "email": "user@example.com",
      "apiToken": "secret",
    }));

    let err = credentials_from_project(&payload).unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
    let message = err.to_string();
    assert!(message.contains("baseUrl"));
    assert!(message.contains("url"));
    assert!(message.contains("host"));
  }

  #[test]
  fn missing_token_is_a_configuration_error() {
    let payload = project(json!({
      "baseUrl": "https://example.atlassian.net",
      "email": "user@example.com",
    }));

    let err = credentials_from_project(&payload).unwrap_err();
    assert!(err.to_string().contains("apiToken"));
    assert!(err.to_string().contains("token"));
  }

  #[test]
  fn empty_values_count_as_missing() {
    let payload = project(json!({
      "baseUrl": "",
      "url": "https://wiki.example.com",
      "email": "user@example.com",
      "apiToken": "secret",
      "spaceKey": "  ",
    }));

    let credentials = credentials_from_project(&payload).unwrap();
    assert_eq!(credentials.base_url, "https://wiki.example.com");
    assert_eq!(credentials.default_space_key, None);
  }
}
