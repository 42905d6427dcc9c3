//! The tool-call protocol: JSON-RPC envelope types, the closed tool
//! registry, typed dispatch, and the HTTP transport.

pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod tools;

pub use dispatch::{DispatchContext, execute_tool};
pub use protocol::{IncomingMessage, JsonRpcError, JsonRpcResponse, RequestId};
pub use server::{GatewayState, routes, serve};
pub use tools::{Tool, list_tools};
