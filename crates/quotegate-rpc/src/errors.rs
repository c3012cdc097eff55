//! Error taxonomy and JSON-RPC error codes.

// ── JSON-RPC error code constants ───────────────────────────────────

/// Input could not be interpreted as a valid envelope.
pub const PARSE_ERROR: i64 = -32700;
/// Requested method/tool is not registered.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Parameters missing or rejected by tool validation.
pub const INVALID_PARAMS: i64 = -32602;
/// Tool execution failed (upstream I/O, unexpected internal state).
pub const INTERNAL_ERROR: i64 = -32000;

/// Error returned by tool handlers.
///
/// Every variant is recoverable per-request; none terminates the gateway.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments missing, malformed, or rejected by the tool's validation.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The upstream exchange request failed (network, non-2xx, bad body).
    #[error("exchange request failed: {0}")]
    Upstream(String),
}

impl ToolError {
    /// JSON-RPC error code for this variant.
    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Upstream(_) => INTERNAL_ERROR,
        }
    }
}

/// Startup configuration error raised by the tool registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A tool with this name is already registered. Fatal at startup.
    #[error("tool '{name}' is already registered")]
    Duplicate {
        /// The conflicting tool name.
        name: String,
    },
}

/// Error returned when invoking a named tool through the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No tool with the requested name is registered.
    #[error("tool '{name}' not found")]
    ToolNotFound {
        /// The unresolved tool name.
        name: String,
    },

    /// The resolved tool's execution failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The tool did not complete within the allowed time.
    #[error("tool '{name}' timed out")]
    Timeout {
        /// The tool that timed out.
        name: String,
    },
}

impl DispatchError {
    /// JSON-RPC error code for this variant.
    pub fn code(&self) -> i64 {
        match self {
            Self::ToolNotFound { .. } => METHOD_NOT_FOUND,
            Self::Tool(err) => err.code(),
            Self::Timeout { .. } => INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params_code() {
        let err = ToolError::InvalidParams("missing 'symbol'".into());
        assert_eq!(err.code(), INVALID_PARAMS);
        assert_eq!(err.to_string(), "invalid params: missing 'symbol'");
    }

    #[test]
    fn upstream_code() {
        let err = ToolError::Upstream("connection refused".into());
        assert_eq!(err.code(), INTERNAL_ERROR);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn duplicate_registration_message() {
        let err = RegistryError::Duplicate {
            name: "get_price".into(),
        };
        assert_eq!(err.to_string(), "tool 'get_price' is already registered");
    }

    #[test]
    fn dispatch_not_found_code() {
        let err = DispatchError::ToolNotFound {
            name: "bogus".into(),
        };
        assert_eq!(err.code(), METHOD_NOT_FOUND);
        assert_eq!(err.to_string(), "tool 'bogus' not found");
    }

    #[test]
    fn dispatch_tool_error_keeps_inner_code() {
        let err = DispatchError::from(ToolError::Upstream("boom".into()));
        assert_eq!(err.code(), INTERNAL_ERROR);

        let err = DispatchError::from(ToolError::InvalidParams("bad".into()));
        assert_eq!(err.code(), INVALID_PARAMS);
    }

    #[test]
    fn dispatch_timeout_code() {
        let err = DispatchError::Timeout {
            name: "get_klines".into(),
        };
        assert_eq!(err.code(), INTERNAL_ERROR);
        assert!(err.to_string().contains("timed out"));
    }
}
