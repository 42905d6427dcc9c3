//! HTTP-level tests for the protocol endpoint.
//!
//! Discovery methods, envelope validation, authentication, and the unknown
//! tool path are all decided before any tenant credential is resolved, so
//! these run against the real route tree with no network.

use std::sync::Arc;

use confluence_gateway::config::GatewayConfig;
use confluence_gateway::rpc::server::{GatewayState, routes};
use serde_json::{Value, json};

fn test_state() -> Arc<GatewayState> {
  // The registry is never reached by these tests; discovery and the
  // pre-resolution error paths short-circuit first.
  let config = GatewayConfig {
    registry_base_url: String::from("http://127.0.0.1:9"),
    registry_auth_token: None,
    backend_timeout_secs: 5,
    staging_host: None,
    issue_tracker_base_url: None,
  };
  Arc::new(GatewayState::new(config).unwrap())
}

async fn post_rpc(body: &Value) -> (u16, Value) {
  let filter = routes(test_state());
  let response = warp::test::request()
    .method("POST")
    .path("/rpc")
    .json(body)
    .reply(&filter)
    .await;
  let status = response.status().as_u16();
  let body: Value = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
  (status, body)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
  let filter = routes(test_state());
  let response = warp::test::request().method("GET").path("/health").reply(&filter).await;
  assert_eq!(response.status(), 200);
  let body: Value = serde_json::from_slice(response.body()).unwrap();
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn initialize_needs_no_credentials() {
  let (status, body) = post_rpc(&json!({
    "jsonrpc": "2.0",
    "id": 1,
    "method": "initialize",
    "params": { "protocolVersion": "2024-11-05", "capabilities": {} },
  }))
  .await;

  assert_eq!(status, 200);
  assert_eq!(body["jsonrpc"], "2.0");
  assert_eq!(body["id"], 1);
  assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
  assert_eq!(body["result"]["serverInfo"]["name"], "confluence-gateway");
  assert!(body["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn tools_list_needs_no_credentials_and_is_complete() {
  let (status, body) = post_rpc(&json!({
    "jsonrpc": "2.0",
    "id": 2,
    "method": "tools/list",
  }))
  .await;

  assert_eq!(status, 200);
  let tools = body["result"]["tools"].as_array().unwrap();
  assert_eq!(tools.len(), 32);
  assert!(tools.iter().any(|tool| tool["name"] == "create_page"));
  assert!(tools.iter().any(|tool| tool["name"] == "upload_and_embed_document"));
  assert!(tools.iter().all(|tool| tool["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn ping_returns_empty_result() {
  let (status, body) = post_rpc(&json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" })).await;
  assert_eq!(status, 200);
  assert_eq!(body["result"], json!({}));
}

#[tokio::test]
async fn initialized_notification_is_acknowledged_without_content() {
  let (status, _) = post_rpc(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).await;
  assert_eq!(status, 202);
}

#[tokio::test]
async fn tool_call_without_credentials_is_unauthorized() {
  let (status, body) = post_rpc(&json!({
    "jsonrpc": "2.0",
    "id": 4,
    "method": "tools/call",
    "params": { "name": "get_spaces", "arguments": {} },
  }))
  .await;

  assert_eq!(status, 401);
  assert_eq!(body["error"]["code"], -32600);
  assert_eq!(body["id"], 4);
}

#[tokio::test]
async fn unknown_tool_fails_identically_regardless_of_key() {
  let filter = routes(test_state());
  let request = json!({
    "jsonrpc": "2.0",
    "id": 5,
    "method": "tools/call",
    "params": { "name": "frobnicate_page", "arguments": {} },
  });

  for headers in [("authorization", "Bearer pk_valid_or_not"), ("x-api-key", "anything")] {
    let response = warp::test::request()
      .method("POST")
      .path("/rpc")
      .header(headers.0, headers.1)
      .json(&request)
      .reply(&filter)
      .await;

    assert_eq!(response.status(), 400);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"]["code"], -32601);
    assert!(body["error"]["message"].as_str().unwrap().contains("frobnicate_page"));
  }
}

#[tokio::test]
async fn tool_call_without_name_is_invalid() {
  let filter = routes(test_state());
  let response = warp::test::request()
    .method("POST")
    .path("/rpc")
    .header("x-api-key", "pk_123")
    .json(&json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {} }))
    .reply(&filter)
    .await;

  assert_eq!(response.status(), 400);
  let body: Value = serde_json::from_slice(response.body()).unwrap();
  assert_eq!(body["error"]["code"], -32600);
  assert!(body["error"]["message"].as_str().unwrap().contains("tool name"));
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
  let (status, body) = post_rpc(&json!({ "jsonrpc": "2.0", "id": 7, "method": "resources/list" })).await;
  assert_eq!(status, 400);
  assert_eq!(body["error"]["code"], -32601);
  assert!(body["error"]["message"].as_str().unwrap().contains("resources/list"));
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
  let (status, body) = post_rpc(&json!({ "jsonrpc": "1.0", "id": 8, "method": "ping" })).await;
  assert_eq!(status, 400);
  assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn non_object_body_is_invalid_request() {
  let (status, body) = post_rpc(&json!([1, 2, 3])).await;
  assert_eq!(status, 400);
  assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn unparseable_body_is_a_parse_error() {
  let filter = routes(test_state());
  let response = warp::test::request()
    .method("POST")
    .path("/rpc")
    .header("content-type", "application/json")
    .body("{not valid json")
    .reply(&filter)
    .await;

  assert_eq!(response.status(), 400);
  let body: Value = serde_json::from_slice(response.body()).unwrap();
  assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
  let filter = routes(test_state());
  let response = warp::test::request().method("GET").path("/nope").reply(&filter).await;
  assert_eq!(response.status(), 404);
}
