//! HTTP transport for the tool-call protocol.
//!
//! One POST endpoint carries the whole protocol. Discovery methods
//! (`initialize`, `tools/list`, `ping`, the initialized notification)
//! answer without touching credentials; `tools/call` authenticates, builds
//! a tenant-scoped client, and dispatches. Each inbound request is handled
//! independently; the server holds no per-tenant state between requests.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use super::dispatch::{DispatchContext, execute_tool};
use super::protocol::{
  IncomingMessage, JsonRpcError, JsonRpcResponse, PROTOCOL_VERSION, RequestId, SERVER_NAME, parse_message,
};
use super::tools::{Tool, list_tools};
use crate::config::GatewayConfig;
use crate::confluence::ConfluenceClient;
use crate::content::{ContentEngine, HttpRemoteFiles};
use crate::error::{GatewayError, RPC_INVALID_REQUEST};
use crate::registry::RegistryClient;

/// Long-lived server state shared by every request.
pub struct GatewayState {
  config: GatewayConfig,
  registry: RegistryClient,
  remote: HttpRemoteFiles,
}

impl GatewayState {
  /// Build the shared state from the gateway configuration.
  ///
  /// # Errors
  /// Returns an error when the registry or file-fetch HTTP clients cannot
  /// be constructed.
  pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
    let registry = RegistryClient::new(&config)?;
    let remote = HttpRemoteFiles::new(config.backend_timeout_secs)?;
    Ok(Self {
      config,
      registry,
      remote,
    })
  }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
  #[serde(default)]
  name: String,
  #[serde(default)]
  arguments: Value,
}

/// Assemble the warp route tree: `POST /rpc` plus `GET /health`.
pub fn routes(
  state: Arc<GatewayState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
  let rpc = warp::path("rpc")
    .and(warp::path::end())
    .and(warp::post())
    .and(warp::header::optional::<String>("authorization"))
    .and(warp::header::optional::<String>("x-api-key"))
    .and(warp::body::json())
    .and_then(move |authorization, api_key_header, body: Value| {
      let state = state.clone();
      async move {
        Ok::<_, warp::Rejection>(handle_rpc(&state, authorization, api_key_header, &body).await)
      }
    });

  let health = warp::path("health")
    .and(warp::path::end())
    .and(warp::get())
    .map(|| warp::reply::with_status(warp::reply::json(&json!({ "status": "ok" })), StatusCode::OK));

  health.or(rpc).recover(handle_rejection)
}

/// Run the gateway until interrupted.
///
/// # Arguments
/// * `config` - Validated gateway configuration.
/// * `addr` - Socket address to bind.
pub async fn serve(config: GatewayConfig, addr: SocketAddr) -> anyhow::Result<()> {
  let state = Arc::new(GatewayState::new(config)?);
  let routes = routes(state);

  let (bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
    let _ = tokio::signal::ctrl_c().await;
  });

  info!("gateway listening on {bound}");
  server.await;
  info!("gateway shut down");
  Ok(())
}

async fn handle_rejection(rejection: warp::Rejection) -> Result<WithStatus<Json>, warp::Rejection> {
  if rejection.find::<warp::filters::body::BodyDeserializeError>().is_some() {
    let error = JsonRpcError::parse_error();
    return Ok(warp::reply::with_status(warp::reply::json(&error), StatusCode::BAD_REQUEST));
  }

  if rejection.is_not_found() {
    return Ok(warp::reply::with_status(
      warp::reply::json(&json!({ "error": "not found" })),
      StatusCode::NOT_FOUND,
    ));
  }

  if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
    return Ok(warp::reply::with_status(
      warp::reply::json(&json!({ "error": "method not allowed" })),
      StatusCode::METHOD_NOT_ALLOWED,
    ));
  }

  Ok(warp::reply::with_status(
    warp::reply::json(&json!({ "error": "internal server error" })),
    StatusCode::INTERNAL_SERVER_ERROR,
  ))
}

/// Pull the caller's API key from either accepted header.
fn extract_api_key(authorization: Option<&str>, api_key_header: Option<&str>) -> Option<String> {
  if let Some(key) = api_key_header {
    let key = key.trim();
    if !key.is_empty() {
      return Some(key.to_string());
    }
  }

  authorization
    .and_then(|header| header.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|key| !key.is_empty())
    .map(str::to_string)
}

fn reply_success(id: RequestId, result: Value) -> WithStatus<Json> {
  let response = JsonRpcResponse::success(id, result);
  warp::reply::with_status(warp::reply::json(&response), StatusCode::OK)
}

fn reply_rpc_error(error: JsonRpcError, status: StatusCode) -> WithStatus<Json> {
  warp::reply::with_status(warp::reply::json(&error), status)
}

fn reply_gateway_error(id: Option<RequestId>, err: &GatewayError) -> WithStatus<Json> {
  debug!("tool call failed: {err}");
  let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  reply_rpc_error(JsonRpcError::new(id, err.rpc_code(), err.to_string()), status)
}

async fn handle_rpc(
  state: &GatewayState,
  authorization: Option<String>,
  api_key_header: Option<String>,
  body: &Value,
) -> WithStatus<Json> {
  let message = match parse_message(body) {
    Ok(message) => message,
    Err(error) => return reply_rpc_error(error, StatusCode::BAD_REQUEST),
  };

  match message {
    IncomingMessage::Notification(notification) => {
      // Client-initiated notifications are acknowledged without content.
      debug!(method = %notification.method, "acknowledging notification");
      warp::reply::with_status(warp::reply::json(&Value::Null), StatusCode::ACCEPTED)
    }
    IncomingMessage::Request(request) => match request.method.as_str() {
      "initialize" => reply_success(
        request.id,
        json!({
          "protocolVersion": PROTOCOL_VERSION,
          "capabilities": { "tools": {} },
          "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
          },
        }),
      ),
      "tools/list" => reply_success(request.id, list_tools()),
      "ping" => reply_success(request.id, json!({})),
      "tools/call" => {
        handle_tool_call(
          state,
          request.id,
          request.params,
          extract_api_key(authorization.as_deref(), api_key_header.as_deref()),
        )
        .await
      }
      other => reply_rpc_error(JsonRpcError::method_not_found(request.id, other), StatusCode::BAD_REQUEST),
    },
  }
}

async fn handle_tool_call(
  state: &GatewayState,
  id: RequestId,
  params: Option<Value>,
  api_key: Option<String>,
) -> WithStatus<Json> {
  let Some(api_key) = api_key else {
    return reply_rpc_error(
      JsonRpcError::new(
        Some(id),
        RPC_INVALID_REQUEST,
        "Unauthorized: provide an API key via the x-api-key header or a bearer token",
      ),
      StatusCode::UNAUTHORIZED,
    );
  };

  let params: ToolCallParams = match params.map(serde_json::from_value::<ToolCallParams>).transpose() {
    Ok(Some(params)) if !params.name.is_empty() => params,
    _ => {
      return reply_rpc_error(
        JsonRpcError::new(Some(id), RPC_INVALID_REQUEST, "Invalid Request: tool name required in params"),
        StatusCode::BAD_REQUEST,
      );
    }
  };

  // The tool registry is closed; check membership before spending a
  // registry round-trip, so an unknown name fails the same way no matter
  // what key accompanied it.
  let Some(tool) = Tool::from_name(&params.name) else {
    return reply_gateway_error(Some(id), &GatewayError::UnknownTool(params.name));
  };

  let credentials = match state.registry.resolve(&api_key).await {
    Ok(credentials) => credentials,
    Err(err) => return reply_gateway_error(Some(id), &err),
  };

  let client = match ConfluenceClient::new(&credentials, state.config.backend_timeout_secs) {
    Ok(client) => client,
    Err(err) => return reply_gateway_error(Some(id), &err),
  };

  let engine = ContentEngine::new(client, state.remote.clone(), state.config.staging_host.clone());
  let ctx = DispatchContext {
    default_space_key: credentials.default_space_key.as_deref(),
    issue_tracker_base_url: credentials
      .issue_tracker_base_url
      .as_deref()
      .or(state.config.issue_tracker_base_url.as_deref()),
  };

  match execute_tool(tool, params.arguments, &engine, &ctx).await {
    Ok(result) => reply_success(
      id,
      json!({
        "success": true,
        "tool": tool.name(),
        "result": result,
      }),
    ),
    Err(err) => reply_gateway_error(Some(id), &err),
  }
}
