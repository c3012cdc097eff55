//! HTTP client for the upstream exchange REST API.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use quotegate_rpc::ToolError;

/// Counter: upstream requests issued, labeled by endpoint path.
pub const EXCHANGE_REQUESTS_TOTAL: &str = "exchange_requests_total";
/// Counter: upstream requests that failed, labeled by endpoint path.
pub const EXCHANGE_ERRORS_TOTAL: &str = "exchange_errors_total";

/// Thin wrapper over [`reqwest::Client`] pinned to one exchange base URL.
///
/// All tool handlers share a single instance so connection pooling and
/// the request timeout apply uniformly.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeClient {
    /// Build a client for `base_url` with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The configured base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with `query` and decode the body as JSON.
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies all
    /// surface as [`ToolError::Upstream`].
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        metrics::counter!(EXCHANGE_REQUESTS_TOTAL, "endpoint" => path.to_string()).increment(1);
        debug!(%url, "exchange request");

        let response = self.http.get(&url).query(query).send().await.map_err(|e| {
            metrics::counter!(EXCHANGE_ERRORS_TOTAL, "endpoint" => path.to_string()).increment(1);
            warn!(%url, error = %e, "exchange request failed");
            ToolError::Upstream(format!("request to {path} failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            metrics::counter!(EXCHANGE_ERRORS_TOTAL, "endpoint" => path.to_string()).increment(1);
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, "exchange returned error status");
            return Err(ToolError::Upstream(format!(
                "{path} returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            metrics::counter!(EXCHANGE_ERRORS_TOTAL, "endpoint" => path.to_string()).increment(1);
            ToolError::Upstream(format!("{path} returned invalid JSON: {e}"))
        })
    }
}
