//! Command-line interface definitions for confluence-gateway.
//!
//! All runtime configuration enters through these flags (with environment
//! fallbacks); nothing else is read from the environment once parsing is
//! done.

use std::net::SocketAddr;

use clap::Parser;

use crate::config::{DEFAULT_BACKEND_TIMEOUT_SECS, GatewayConfig};

/// confluence-gateway - Multi-tenant JSON-RPC gateway for Confluence
#[derive(Debug, Parser)]
#[command(
  name = "confluence-gateway",
  version,
  about = "Multi-tenant JSON-RPC gateway for the Confluence REST API",
  long_about = "Exposes a Confluence backend through a tool-call protocol.\n\
                Callers authenticate with a project API key, which the gateway resolves\n\
                to per-tenant Confluence credentials via an external project registry."
)]
pub struct Cli {
  /// Server options
  #[command(flatten)]
  pub server: ServerOptions,

  /// Registry options
  #[command(flatten)]
  pub registry: RegistryOptions,

  /// Backend options
  #[command(flatten)]
  pub backend: BackendOptions,

  /// Behavior options
  #[command(flatten)]
  pub behavior: BehaviorOptions,
}

/// Options controlling the listening socket.
#[derive(Debug, clap::Args)]
pub struct ServerOptions {
  /// Address and port to bind
  #[arg(long, env = "GATEWAY_BIND", default_value = "127.0.0.1:8787", value_name = "ADDR")]
  pub bind: SocketAddr,
}

/// Options for reaching the project registry.
#[derive(Debug, clap::Args)]
pub struct RegistryOptions {
  /// Base URL of the project registry service
  #[arg(long, env = "PROJECT_REGISTRY_URL", value_name = "URL")]
  pub registry_url: String,

  /// Bearer token presented to the registry itself
  #[arg(long, env = "REGISTRY_AUTH_TOKEN", value_name = "TOKEN")]
  pub registry_token: Option<String>,
}

/// Options applied to outbound backend requests.
#[derive(Debug, clap::Args)]
pub struct BackendOptions {
  /// Timeout in seconds for outbound requests
  #[arg(long, env = "BACKEND_TIMEOUT_SECS", default_value_t = DEFAULT_BACKEND_TIMEOUT_SECS, value_name = "SECONDS")]
  pub timeout: u64,

  /// Host of the object store used for large-file upload staging
  #[arg(long, env = "STAGING_HOST", value_name = "HOST")]
  pub staging_host: Option<String>,

  /// Fallback issue-tracker base URL for Jira link operations
  #[arg(long, env = "ISSUE_TRACKER_URL", value_name = "URL")]
  pub issue_tracker_url: Option<String>,
}

/// Options controlling logging behavior.
#[derive(Debug, clap::Args)]
pub struct BehaviorOptions {
  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Only log errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,
}

impl Cli {
  /// Parse command-line arguments.
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Validate arguments beyond what clap checks structurally.
  ///
  /// # Returns
  /// `Ok(())` when the configuration is usable, otherwise a human-readable
  /// description of the first problem found.
  pub fn validate(&self) -> Result<(), String> {
    self.gateway_config().validate()
  }

  /// Assemble the explicit configuration passed to the server.
  pub fn gateway_config(&self) -> GatewayConfig {
    GatewayConfig {
      registry_base_url: self.registry.registry_url.clone(),
      registry_auth_token: self.registry.registry_token.clone(),
      backend_timeout_secs: self.backend.timeout,
      staging_host: self.backend.staging_host.clone(),
      issue_tracker_base_url: self.backend.issue_tracker_url.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
  }

  #[test]
  fn minimal_invocation_parses() {
    let cli = parse(&["confluence-gateway", "--registry-url", "https://registry.example.com"]);
    assert_eq!(cli.backend.timeout, DEFAULT_BACKEND_TIMEOUT_SECS);
    assert_eq!(cli.server.bind.port(), 8787);
    assert!(cli.validate().is_ok());
  }

  #[test]
  fn all_options_parse() {
    let cli = parse(&[
      "confluence-gateway",
      "--registry-url",
      "https://registry.example.com",
      "--registry-token",
      "tok",
      "--bind",
      "0.0.0.0:9000",
      "--timeout",
      "10",
      "--staging-host",
      "blob.example.com",
      "--issue-tracker-url",
      "https://issues.example.com",
      "-vv",
    ]);

    let config = cli.gateway_config();
    assert_eq!(config.registry_auth_token.as_deref(), Some("tok"));
    assert_eq!(config.backend_timeout_secs, 10);
    assert_eq!(config.staging_host.as_deref(), Some("blob.example.com"));
    assert_eq!(cli.behavior.verbose, 2);
    assert!(cli.validate().is_ok());
  }

  #[test]
  fn invalid_registry_url_fails_validation() {
    let cli = parse(&["confluence-gateway", "--registry-url", "not a url"]);
    assert!(cli.validate().is_err());
  }

  #[test]
  fn quiet_conflicts_with_verbose() {
    let result = Cli::try_parse_from(["confluence-gateway", "--registry-url", "https://r.example.com", "-q", "-v"]);
    assert!(result.is_err());
  }
}
