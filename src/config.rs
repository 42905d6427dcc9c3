//! Runtime configuration for the gateway.
//!
//! All options are explicit values passed into the resolver and server
//! constructors at startup; nothing is read from the environment after the
//! CLI has been parsed.

use url::Url;

/// Default timeout applied to every outbound backend request.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Gateway-wide configuration assembled from the command line.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  /// Base URL of the project registry service.
  pub registry_base_url: String,
  /// Optional bearer token presented to the registry itself.
  pub registry_auth_token: Option<String>,
  /// Timeout in seconds for outbound Confluence, registry, and file
  /// requests.
  pub backend_timeout_secs: u64,
  /// Host of the object store used for large-file upload staging. Blobs
  /// fetched from this host are deleted after an upload-and-embed cycle.
  pub staging_host: Option<String>,
  /// Fallback issue-tracker base URL used when a tenant's registry record
  /// does not carry one.
  pub issue_tracker_base_url: Option<String>,
}

impl GatewayConfig {
  /// Check that configured URLs are well-formed.
  ///
  /// # Returns
  /// `Ok(())` when the configuration can be used to construct clients, or a
  /// human-readable description of the first problem found.
  pub fn validate(&self) -> Result<(), String> {
    if self.registry_base_url.trim().is_empty() {
      return Err(String::from("registry base URL must not be empty"));
    }
    Url::parse(&self.registry_base_url).map_err(|e| format!("invalid registry base URL: {e}"))?;

    if let Some(tracker) = &self.issue_tracker_base_url {
      Url::parse(tracker).map_err(|e| format!("invalid issue tracker base URL: {e}"))?;
    }

    if self.backend_timeout_secs == 0 {
      return Err(String::from("backend timeout must be at least 1 second"));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> GatewayConfig {
    GatewayConfig {
      registry_base_url: String::from("https://registry.example.com"),
      registry_auth_token: None,
      backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
      staging_host: None,
      issue_tracker_base_url: None,
    }
  }

  #[test]
  fn valid_config_passes() {
    assert!(sample().validate().is_ok());
  }

  #[test]
  fn empty_registry_url_fails() {
    let mut config = sample();
    config.registry_base_url = String::new();
    assert!(config.validate().is_err());
  }

  #[test]
  fn malformed_registry_url_fails() {
    let mut config = sample();
    config.registry_base_url = String::from("not a url");
    assert!(config.validate().is_err());
  }

  #[test]
  fn zero_timeout_fails() {
    let mut config = sample();
    config.backend_timeout_secs = 0;
    assert!(config.validate().is_err());
  }

  #[test]
  fn malformed_tracker_url_fails() {
    let mut config = sample();
    config.issue_tracker_base_url = Some(String::from("::nope::"));
    assert!(config.validate().is_err());
  }
}
