//! JSON-RPC 2.0 wire-format types.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Protocol version marker carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Notification method for keep-alive pings.
pub const METHOD_HEARTBEAT: &str = "heartbeat";
/// Notification method wrapping raw broadcast payloads.
pub const METHOD_MESSAGE: &str = "message";
/// Notification method announcing a new stream connection's identifier.
pub const METHOD_CONNECTION_ESTABLISHED: &str = "connection/established";

/// Incoming JSON-RPC request.
///
/// The identifier is kept as a raw [`Value`] so that falsy-but-valid ids
/// (the number `0`, the empty string) survive the round trip untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version marker (tolerated absent on input).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Request identifier; `None` when the caller sent none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name (e.g. `tools/call`).
    pub method: String,
    /// Optional parameters object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Outgoing JSON-RPC response: `result` XOR `error`, never both.
///
/// The XOR invariant is enforced by construction — the only ways to build a
/// response are [`JsonRpcResponse::success`] and [`JsonRpcResponse::error`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version marker, always `"2.0"`.
    pub jsonrpc: String,
    /// Echoed request identifier (`null` when none could be parsed).
    pub id: Value,
    /// Result payload (success responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload (error responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Structured error body inside a [`JsonRpcResponse`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// JSON-RPC error code (e.g. `-32601`).
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

impl JsonRpcResponse {
    /// Build a success response echoing `id` exactly.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response echoing `id` exactly.
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    /// Whether this is a success response.
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }
}

/// Server-originated notification (no id, no response expected).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Protocol version marker, always `"2.0"`.
    pub jsonrpc: String,
    /// Notification method.
    pub method: String,
    /// Notification payload.
    pub params: Value,
}

impl JsonRpcNotification {
    /// Build a notification with the given method and params.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
        }
    }

    /// Keep-alive heartbeat carrying the current timestamp.
    pub fn heartbeat() -> Self {
        Self::new(
            METHOD_HEARTBEAT,
            json!({ "timestamp": chrono::Utc::now().to_rfc3339() }),
        )
    }

    /// Announce a freshly opened connection's identifier.
    pub fn connection_established(connection_id: &str) -> Self {
        Self::new(METHOD_CONNECTION_ESTABLISHED, json!({ "id": connection_id }))
    }

    /// Wrap a raw payload into a `message` notification with a severity level.
    pub fn message(level: &str, data: Value) -> Self {
        Self::new(METHOD_MESSAGE, json!({ "level": level, "data": data }))
    }
}

/// Whether a raw value already looks like a well-formed envelope.
///
/// Used by the broadcaster to decide between passing a payload through as-is
/// and wrapping it into a `message` notification.
pub fn is_envelope(value: &Value) -> bool {
    value.get("jsonrpc").is_some()
        && (value.get("method").is_some()
            || value.get("result").is_some()
            || value.get("error").is_some())
}
