//! JSON-RPC 2.0 envelope types for the tool-call protocol.
//!
//! Requests carry an `id` and expect a response; notifications carry no
//! `id` and are acknowledged without a body. IDs are strings or integers,
//! never null.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RPC_INVALID_REQUEST, RPC_METHOD_NOT_FOUND, RPC_PARSE_ERROR};

/// The protocol version this gateway speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name advertised during the handshake.
pub const SERVER_NAME: &str = "confluence-gateway";

/// A JSON-RPC 2.0 request ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
  /// Numeric request ID.
  Number(i64),
  /// String request ID.
  String(String),
}

/// A request expecting a response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
  /// Must be `"2.0"`.
  pub jsonrpc: String,
  /// Unique request identifier.
  pub id: RequestId,
  /// The method to invoke.
  pub method: String,
  /// Optional method parameters.
  #[serde(default)]
  pub params: Option<Value>,
}

/// A one-way notification; no response is expected.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
  /// Must be `"2.0"`.
  pub jsonrpc: String,
  /// The notification method.
  pub method: String,
  /// Optional notification parameters.
  #[serde(default)]
  pub params: Option<Value>,
}

/// An incoming message that is either a request or a notification.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
  /// A request expecting a response.
  Request(JsonRpcRequest),
  /// A notification (no response expected).
  Notification(JsonRpcNotification),
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
  /// Always `"2.0"`.
  pub jsonrpc: &'static str,
  /// The request ID this response corresponds to.
  pub id: RequestId,
  /// The result of the method call.
  pub result: Value,
}

impl JsonRpcResponse {
  /// Create a success response.
  pub fn success(id: RequestId, result: Value) -> Self {
    Self {
      jsonrpc: "2.0",
      id,
      result,
    }
  }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
  /// The numeric error code.
  pub code: i32,
  /// A short description of the error.
  pub message: String,
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
  /// Always `"2.0"`.
  pub jsonrpc: &'static str,
  /// The request ID this error corresponds to, when it could be read.
  pub id: Option<RequestId>,
  /// The error details.
  pub error: JsonRpcErrorData,
}

impl JsonRpcError {
  /// Create an error response with an explicit code and message.
  pub fn new(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
    Self {
      jsonrpc: "2.0",
      id,
      error: JsonRpcErrorData {
        code,
        message: message.into(),
      },
    }
  }

  /// An unparseable request body.
  pub fn parse_error() -> Self {
    Self::new(None, RPC_PARSE_ERROR, "Parse error")
  }

  /// A structurally invalid envelope.
  pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
    Self::new(id, RPC_INVALID_REQUEST, message)
  }

  /// An unknown protocol method.
  pub fn method_not_found(id: RequestId, method: &str) -> Self {
    Self::new(Some(id), RPC_METHOD_NOT_FOUND, format!("Method not found: {method}"))
  }
}

/// Classify a request body as a request or notification, validating the
/// envelope.
///
/// # Errors
/// Returns a ready-to-send [`JsonRpcError`] when the body is not a valid
/// JSON-RPC 2.0 message.
pub fn parse_message(body: &Value) -> Result<IncomingMessage, JsonRpcError> {
  let object = body
    .as_object()
    .ok_or_else(|| JsonRpcError::invalid_request(None, "Invalid Request: body must be a JSON object"))?;

  let jsonrpc = object.get("jsonrpc").and_then(Value::as_str).unwrap_or_default();
  if jsonrpc != "2.0" {
    let id = object.get("id").and_then(|id| serde_json::from_value(id.clone()).ok());
    return Err(JsonRpcError::invalid_request(id, "Invalid Request: jsonrpc must be \"2.0\""));
  }

  if object.contains_key("id") {
    let request: JsonRpcRequest = serde_json::from_value(body.clone())
      .map_err(|_| JsonRpcError::invalid_request(None, "Invalid Request: malformed request envelope"))?;

    if request.method.is_empty() {
      return Err(JsonRpcError::invalid_request(
        Some(request.id),
        "Invalid Request: method must not be empty",
      ));
    }

    Ok(IncomingMessage::Request(request))
  } else {
    let notification: JsonRpcNotification = serde_json::from_value(body.clone())
      .map_err(|_| JsonRpcError::invalid_request(None, "Invalid Request: malformed notification envelope"))?;

    Ok(IncomingMessage::Notification(notification))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn parse_valid_request() {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} });
    let IncomingMessage::Request(request) = parse_message(&body).unwrap() else {
      panic!("expected a request");
    };
    assert_eq!(request.id, RequestId::Number(1));
    assert_eq!(request.method, "initialize");
  }

  #[test]
  fn parse_valid_notification() {
    let body = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let IncomingMessage::Notification(notification) = parse_message(&body).unwrap() else {
      panic!("expected a notification");
    };
    assert_eq!(notification.method, "notifications/initialized");
  }

  #[test]
  fn parse_string_id() {
    let body = json!({ "jsonrpc": "2.0", "id": "abc-123", "method": "ping" });
    let IncomingMessage::Request(request) = parse_message(&body).unwrap() else {
      panic!("expected a request");
    };
    assert_eq!(request.id, RequestId::String(String::from("abc-123")));
  }

  #[test]
  fn parse_rejects_wrong_version() {
    let body = json!({ "jsonrpc": "1.0", "id": 1, "method": "ping" });
    let err = parse_message(&body).unwrap_err();
    assert_eq!(err.error.code, RPC_INVALID_REQUEST);
    assert_eq!(err.id, Some(RequestId::Number(1)));
  }

  #[test]
  fn parse_rejects_missing_version() {
    let body = json!({ "id": 1, "method": "ping" });
    let err = parse_message(&body).unwrap_err();
    assert_eq!(err.error.code, RPC_INVALID_REQUEST);
  }

  #[test]
  fn parse_rejects_non_object_body() {
    let err = parse_message(&json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.error.code, RPC_INVALID_REQUEST);
  }

  #[test]
  fn success_response_serializes_envelope() {
    let response = JsonRpcResponse::success(RequestId::Number(1), json!({ "ok": true }));
    let serialized = serde_json::to_string(&response).unwrap();
    assert!(serialized.contains(r#""jsonrpc":"2.0""#));
    assert!(serialized.contains(r#""id":1"#));
    assert!(serialized.contains(r#""result":{"ok":true}"#));
  }

  #[test]
  fn error_response_serializes_code_and_message() {
    let error = JsonRpcError::method_not_found(RequestId::Number(2), "unknown/method");
    let serialized = serde_json::to_string(&error).unwrap();
    assert!(serialized.contains(r#""code":-32601"#));
    assert!(serialized.contains("unknown/method"));
  }
}
