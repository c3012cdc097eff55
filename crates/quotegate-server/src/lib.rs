//! # quotegate-server
//!
//! Axum HTTP gateway for streaming JSON-RPC tool access.
//!
//! - `GET /sse` — long-lived server-push stream (connection announce,
//!   pending-message drain, heartbeat)
//! - `POST /messages` — discrete envelope dispatch
//! - `POST /tools/call` — direct tool invocation
//! - `GET /tools` — capability discovery
//! - `POST /broadcast` — fire-and-forget notification fan-out
//! - `GET /health`, `GET /metrics` — operational endpoints
//!
//! Graceful shutdown via `tokio::signal` + `CancellationToken`.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod sse;
