//! `GatewayServer` — axum router and shared state.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use quotegate_rpc::{Dispatcher, JsonRpcResponse, ToolRegistry, errors};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::sse::broadcast::Broadcaster;
use crate::sse::registry::ConnectionRegistry;
use crate::sse::route::sse_handler;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Open stream connections.
    pub connections: Arc<ConnectionRegistry>,
    /// Outbound fan-out with pending buffer.
    pub broadcaster: Arc<Broadcaster>,
    /// Inbound envelope dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Prometheus render handle, when metrics are installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The gateway server: composes registry, broadcaster, and dispatcher.
pub struct GatewayServer {
    state: AppState,
}

impl GatewayServer {
    /// Create a new server over a registered tool set.
    pub fn new(config: ServerConfig, tools: ToolRegistry) -> Self {
        let connections = Arc::new(ConnectionRegistry::new());
        let state = AppState {
            broadcaster: Arc::new(Broadcaster::new(Arc::clone(&connections))),
            connections,
            dispatcher: Arc::new(Dispatcher::new(Arc::new(tools))),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            config: Arc::new(config),
            metrics: None,
        };
        Self { state }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/sse", get(sse_handler))
            .route("/messages", post(post_message))
            .route("/tools", get(list_tools))
            .route("/tools/call", post(call_tool))
            .route("/broadcast", post(broadcast_message))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(axum::extract::DefaultBodyLimit::max(
                self.state.config.max_body_bytes,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and start serving.
    ///
    /// Returns the bound address (resolves port 0 to the assigned port)
    /// and the join handle of the serve task. The task drains open
    /// requests once the shutdown token fires.
    pub async fn listen(
        &self,
    ) -> std::io::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local = listener.local_addr()?;
        let app = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "server task exited with error");
            }
        });
        Ok((local, handle))
    }

    /// The shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The broadcaster (outbound notification entry point).
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.state.broadcaster
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// `POST /messages` — dispatch one envelope, respond synchronously.
///
/// An unparsable body yields HTTP 400 with a `-32700` envelope; every other
/// outcome (including method-not-found and tool errors) is HTTP 200 with the
/// correlated response envelope.
async fn post_message(
    State(state): State<AppState>,
    body: String,
) -> (StatusCode, Json<JsonRpcResponse>) {
    let response = state.dispatcher.dispatch(&body).await;
    let status = match &response.error {
        Some(err) if err.code == errors::PARSE_ERROR => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, Json(response))
}

/// Body of a direct tool-call request.
#[derive(Debug, Deserialize)]
struct ToolCallBody {
    #[serde(default)]
    id: Option<Value>,
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// `POST /tools/call` — direct, non-streaming tool invocation.
async fn call_tool(
    State(state): State<AppState>,
    Json(body): Json<ToolCallBody>,
) -> (StatusCode, Json<JsonRpcResponse>) {
    let id = body.id.unwrap_or(Value::Null);
    match state.dispatcher.call_tool(&body.name, body.arguments).await {
        Ok(result) => (StatusCode::OK, Json(JsonRpcResponse::success(id, result))),
        Err(err) => {
            let code = err.code();
            let status = match code {
                errors::METHOD_NOT_FOUND => StatusCode::NOT_FOUND,
                errors::INVALID_PARAMS => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(JsonRpcResponse::error(id, code, err.to_string())))
        }
    }
}

/// `GET /tools` — capability discovery, registration order.
async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": state.dispatcher.tools().descriptors() }))
}

/// `POST /broadcast` — fire-and-forget notification to all open streams.
async fn broadcast_message(State(state): State<AppState>, Json(body): Json<Value>) -> StatusCode {
    state.broadcaster.send(body);
    StatusCode::ACCEPTED
}

/// `GET /health`.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.connections.count(),
        state.broadcaster.pending_len(),
    ))
}

/// `GET /metrics` — Prometheus text, empty when no recorder is installed.
async fn metrics_handler(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(crate::metrics::render)
        .unwrap_or_default()
}
