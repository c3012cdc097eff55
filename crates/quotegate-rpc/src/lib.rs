//! # quotegate-rpc
//!
//! JSON-RPC 2.0 envelope types, error taxonomy, tool registry, and the
//! dispatcher that correlates inbound tool calls to registered handlers.
//!
//! - Envelope types: request, response (`result` XOR `error`), notification
//! - `ToolRegistry`: immutable-after-startup name → handler mapping
//! - `Dispatcher`: raw payload → well-typed, id-correlated response

#![deny(unsafe_code)]

pub mod dispatch;
pub mod errors;
pub mod registry;
pub mod types;

pub use dispatch::Dispatcher;
pub use errors::{DispatchError, RegistryError, ToolError};
pub use registry::{ToolDescriptor, ToolHandler, ToolRegistry};
pub use types::{ErrorBody, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
