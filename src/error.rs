//! Error taxonomy shared across the gateway.
//!
//! Every failure a caller can observe is one of these variants. The
//! dispatcher converts them into JSON-RPC error envelopes exactly once, at
//! the protocol boundary; lower layers only construct and propagate them.

use thiserror::Error;

/// JSON-RPC error code for a malformed or unauthenticated request.
pub const RPC_INVALID_REQUEST: i32 = -32600;
/// JSON-RPC error code for an unknown method or tool.
pub const RPC_METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error code for internal and upstream failures.
pub const RPC_INTERNAL_ERROR: i32 = -32603;
/// JSON-RPC error code for unparseable request bodies.
pub const RPC_PARSE_ERROR: i32 = -32700;

/// Failures surfaced through the RPC boundary.
#[derive(Error, Debug)]
pub enum GatewayError {
  /// The caller supplied no API key, or the registry rejected it.
  #[error("{0}")]
  Auth(String),

  /// The resolved project exists but its Confluence configuration is
  /// missing or incomplete.
  #[error("{0}")]
  Configuration(String),

  /// A required tool argument is missing or malformed.
  #[error("{0}")]
  Validation(String),

  /// The requested tool name is not in the registry.
  #[error("Unknown tool: {0}")]
  UnknownTool(String),

  /// The Confluence REST API (or the project registry transport) failed.
  /// Carries the upstream HTTP status when one was received.
  #[error("{message}")]
  Backend {
    /// Upstream HTTP status, absent for transport-level failures.
    status: Option<u16>,
    /// Human-readable description, passed through from upstream.
    message: String,
  },

  /// A remote file could not be retrieved or a staged blob could not be
  /// deleted.
  #[error("{0}")]
  Fetch(String),

  /// An attachment upload completed without yielding an attachment id.
  #[error("{0}")]
  Upload(String),
}

impl GatewayError {
  /// Build a `Backend` error from an upstream HTTP status and error body.
  pub fn backend_status(status: u16, detail: impl AsRef<str>) -> Self {
    Self::Backend {
      status: Some(status),
      message: format!("Confluence API returned error {status}: {}", detail.as_ref()),
    }
  }

  /// Build a `Backend` error for a request that never produced a response.
  pub fn backend_transport(err: &reqwest::Error) -> Self {
    let message = if err.is_timeout() {
      String::from("Confluence API request timed out")
    } else {
      format!("Confluence API request failed: {err}")
    };
    Self::Backend { status: None, message }
  }

  /// The JSON-RPC error code this failure maps to.
  pub fn rpc_code(&self) -> i32 {
    match self {
      Self::Auth(_) | Self::Configuration(_) | Self::Validation(_) => RPC_INVALID_REQUEST,
      Self::UnknownTool(_) => RPC_METHOD_NOT_FOUND,
      Self::Backend { .. } | Self::Fetch(_) | Self::Upload(_) => RPC_INTERNAL_ERROR,
    }
  }

  /// The HTTP status mirrored alongside the JSON-RPC code.
  ///
  /// Preserves the caller-visible split between "your input was wrong"
  /// (400-class) and "the system failed" (500-class).
  pub fn http_status(&self) -> u16 {
    match self {
      Self::Auth(_) => 401,
      Self::Configuration(_) | Self::Validation(_) | Self::UnknownTool(_) => 400,
      Self::Backend { .. } | Self::Fetch(_) | Self::Upload(_) => 500,
    }
  }
}
