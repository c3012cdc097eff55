//! Market-data tools served over the gateway.
//!
//! Each tool wraps one read-only endpoint of an exchange REST API
//! (Binance-compatible paths) behind the [`ToolHandler`] trait from
//! `quotegate-rpc`. [`market_tools`] produces the full set for
//! registration at startup.
//!
//! [`ToolHandler`]: quotegate_rpc::ToolHandler

#![deny(unsafe_code)]

pub mod client;
pub mod market;

pub use client::ExchangeClient;
pub use market::{GetKlines, GetOrderBook, GetPrice, GetRecentTrades, market_tools};
