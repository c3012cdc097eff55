//! SSE stream gateway: connection management, buffering, heartbeat.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Per-connection output channel and write bookkeeping |
//! | `registry` | Open-connection index: register, idempotent remove, snapshot |
//! | `broadcast` | Fan-out with FIFO pending buffer while no connection is open |
//! | `heartbeat` | Periodic keep-alive envelopes, dead-connection cleanup |
//! | `route` | `GET /sse` handler: announce → drain → heartbeat → stream |
//!
//! ## Data flow
//!
//! `route` opens connections through `broadcast` (register, announce, and
//! pending-queue drain under one lock) and spawns one `heartbeat` task per
//! connection. Outbound notifications go through `broadcast` to every open
//! connection, or into the pending queue.

pub mod broadcast;
pub mod connection;
pub mod heartbeat;
pub mod registry;
pub mod route;
