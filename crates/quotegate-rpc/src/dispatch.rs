//! Inbound envelope dispatch — parse, resolve, invoke, correlate.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::errors::{self, DispatchError, ToolError};
use crate::registry::ToolRegistry;
use crate::types::{JsonRpcRequest, JsonRpcResponse};

/// Method name for tool invocation requests.
pub const METHOD_TOOLS_CALL: &str = "tools/call";
/// Method name for capability discovery requests.
pub const METHOD_TOOLS_LIST: &str = "tools/list";

/// Counter: dispatched requests, labeled by method.
pub const RPC_REQUESTS_TOTAL: &str = "rpc_requests_total";
/// Counter: dispatch failures, labeled by error type.
pub const RPC_ERRORS_TOTAL: &str = "rpc_errors_total";
/// Histogram: request handling duration, labeled by method.
pub const RPC_REQUEST_DURATION_SECONDS: &str = "rpc_request_duration_seconds";

/// Correlates inbound envelopes to registered tools and builds typed
/// responses. Stateless per request: nothing survives a dispatch call.
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
}

impl Dispatcher {
    /// Maximum time a single tool call is allowed to run.
    const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a dispatcher over a shared tool registry.
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// The underlying tool registry.
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Dispatch a raw payload and return a correlated response envelope.
    ///
    /// Parse failures yield `-32700` with a `null` id. When the payload is
    /// valid JSON but not a valid request shape, the id is still salvaged
    /// from the payload so the caller can correlate the error.
    pub async fn dispatch(&self, raw: &str) -> JsonRpcResponse {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparsable payload");
                counter!(RPC_ERRORS_TOTAL, "error_type" => "parse_error").increment(1);
                return JsonRpcResponse::error(
                    Value::Null,
                    errors::PARSE_ERROR,
                    format!("Parse error: {e}"),
                );
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                warn!(error = %e, "malformed request envelope");
                counter!(RPC_ERRORS_TOTAL, "error_type" => "parse_error").increment(1);
                return JsonRpcResponse::error(
                    id,
                    errors::PARSE_ERROR,
                    format!("Invalid request: {e}"),
                );
            }
        };

        self.dispatch_request(request).await
    }

    /// Dispatch an already-parsed request.
    pub async fn dispatch_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.unwrap_or(Value::Null);
        let method = request.method;
        counter!(RPC_REQUESTS_TOTAL, "method" => method.clone()).increment(1);
        debug!(method, "dispatching request");

        let start = std::time::Instant::now();
        let response = match method.as_str() {
            METHOD_TOOLS_LIST => {
                JsonRpcResponse::success(id, json!({ "tools": self.tools.descriptors() }))
            }
            METHOD_TOOLS_CALL => self.handle_tool_call(id, request.params).await,
            other => {
                counter!(RPC_ERRORS_TOTAL, "error_type" => "method_not_found").increment(1);
                JsonRpcResponse::error(
                    id,
                    errors::METHOD_NOT_FOUND,
                    format!("Method '{other}' not found"),
                )
            }
        };

        histogram!(RPC_REQUEST_DURATION_SECONDS, "method" => method)
            .record(start.elapsed().as_secs_f64());
        response
    }

    /// Resolve and invoke a named tool, returning its raw result.
    ///
    /// Used both by `tools/call` dispatch and by the direct call endpoint.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, DispatchError> {
        let Some(tool) = self.tools.get(name) else {
            counter!(RPC_ERRORS_TOTAL, "error_type" => "method_not_found").increment(1);
            return Err(DispatchError::ToolNotFound { name: name.into() });
        };

        match tokio::time::timeout(Self::TOOL_TIMEOUT, tool.call(arguments)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => {
                counter!(RPC_ERRORS_TOTAL, "error_type" => "tool_error").increment(1);
                warn!(tool = name, error = %err, "tool call failed");
                Err(DispatchError::Tool(err))
            }
            Err(_elapsed) => {
                counter!(RPC_ERRORS_TOTAL, "error_type" => "timeout").increment(1);
                tracing::error!(tool = name, "tool call timed out after {:?}", Self::TOOL_TIMEOUT);
                Err(DispatchError::Timeout { name: name.into() })
            }
        }
    }

    /// Handle a `tools/call` request body.
    async fn handle_tool_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(
                id,
                errors::INVALID_PARAMS,
                "Missing params for tools/call",
            );
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                id,
                errors::INVALID_PARAMS,
                "Missing 'name' in tools/call params",
            );
        };
        let arguments = params.get("arguments").cloned();

        match self.call_tool(name, arguments).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::error(id, err.code(), err.to_string()),
        }
    }
}
