//! The market-data tool set.
//!
//! Four read-only tools over the exchange REST API:
//!
//! | Tool | Endpoint |
//! |------|----------|
//! | `get_price` | `/api/v3/ticker/price` |
//! | `get_order_book` | `/api/v3/depth` |
//! | `get_recent_trades` | `/api/v3/trades` |
//! | `get_klines` | `/api/v3/klines` |
//!
//! Parameter validation happens here, before any network call, and maps
//! to [`ToolError::InvalidParams`]. Upstream failures come back from
//! [`ExchangeClient`] as [`ToolError::Upstream`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use quotegate_rpc::{ToolDescriptor, ToolError, ToolHandler};

use crate::client::ExchangeClient;

/// Candlestick intervals accepted by the exchange.
const KLINE_INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

/// Build the complete tool set over one shared client.
pub fn market_tools(client: Arc<ExchangeClient>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        Arc::new(GetPrice::new(Arc::clone(&client))),
        Arc::new(GetOrderBook::new(Arc::clone(&client))),
        Arc::new(GetRecentTrades::new(Arc::clone(&client))),
        Arc::new(GetKlines::new(client)),
    ]
}

/// Decode tool arguments into a typed parameter struct.
fn parse_args<T: serde::de::DeserializeOwned>(arguments: Option<Value>) -> Result<T, ToolError> {
    let value = arguments.unwrap_or_else(|| json!({}));
    serde_json::from_value(value).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// Validate and normalize a trading-pair symbol (uppercased).
fn normalize_symbol(symbol: &str) -> Result<String, ToolError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidParams("symbol must not be empty".to_string()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ToolError::InvalidParams(format!(
            "symbol {trimmed:?} contains invalid characters"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Clamp an optional row limit into the exchange's accepted range.
fn clamp_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, max)
}

#[derive(Debug, Deserialize)]
struct SymbolParams {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct SymbolLimitParams {
    symbol: String,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct KlinesParams {
    symbol: String,
    interval: String,
    #[serde(default)]
    limit: Option<u32>,
}

/// Latest traded price for one symbol.
pub struct GetPrice {
    client: Arc<ExchangeClient>,
}

impl GetPrice {
    /// Create the tool over a shared client.
    pub fn new(client: Arc<ExchangeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetPrice {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_price".to_string(),
            description: "Latest traded price for a trading pair".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading pair, e.g. BTCUSDT" }
                },
                "required": ["symbol"]
            }),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> Result<Value, ToolError> {
        let params: SymbolParams = parse_args(arguments)?;
        let symbol = normalize_symbol(&params.symbol)?;
        self.client
            .get_json("/api/v3/ticker/price", &[("symbol", symbol)])
            .await
    }
}

/// Bid/ask depth snapshot for one symbol.
pub struct GetOrderBook {
    client: Arc<ExchangeClient>,
}

impl GetOrderBook {
    /// Create the tool over a shared client.
    pub fn new(client: Arc<ExchangeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetOrderBook {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_order_book".to_string(),
            description: "Order book depth for a trading pair".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading pair, e.g. BTCUSDT" },
                    "limit": { "type": "integer", "description": "Depth rows per side, max 5000" }
                },
                "required": ["symbol"]
            }),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> Result<Value, ToolError> {
        let params: SymbolLimitParams = parse_args(arguments)?;
        let symbol = normalize_symbol(&params.symbol)?;
        let limit = clamp_limit(params.limit, 100, 5000);
        self.client
            .get_json(
                "/api/v3/depth",
                &[("symbol", symbol), ("limit", limit.to_string())],
            )
            .await
    }
}

/// Most recent public trades for one symbol.
pub struct GetRecentTrades {
    client: Arc<ExchangeClient>,
}

impl GetRecentTrades {
    /// Create the tool over a shared client.
    pub fn new(client: Arc<ExchangeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetRecentTrades {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_recent_trades".to_string(),
            description: "Recent public trades for a trading pair".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading pair, e.g. BTCUSDT" },
                    "limit": { "type": "integer", "description": "Number of trades, max 1000" }
                },
                "required": ["symbol"]
            }),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> Result<Value, ToolError> {
        let params: SymbolLimitParams = parse_args(arguments)?;
        let symbol = normalize_symbol(&params.symbol)?;
        let limit = clamp_limit(params.limit, 500, 1000);
        self.client
            .get_json(
                "/api/v3/trades",
                &[("symbol", symbol), ("limit", limit.to_string())],
            )
            .await
    }
}

/// Candlestick (kline) history for one symbol.
pub struct GetKlines {
    client: Arc<ExchangeClient>,
}

impl GetKlines {
    /// Create the tool over a shared client.
    pub fn new(client: Arc<ExchangeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetKlines {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_klines".to_string(),
            description: "Candlestick history for a trading pair".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "description": "Trading pair, e.g. BTCUSDT" },
                    "interval": { "type": "string", "description": "Candle interval, e.g. 1m, 1h, 1d" },
                    "limit": { "type": "integer", "description": "Number of candles, max 1000" }
                },
                "required": ["symbol", "interval"]
            }),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> Result<Value, ToolError> {
        let params: KlinesParams = parse_args(arguments)?;
        let symbol = normalize_symbol(&params.symbol)?;
        if !KLINE_INTERVALS.contains(&params.interval.as_str()) {
            return Err(ToolError::InvalidParams(format!(
                "unknown interval {:?}, expected one of {}",
                params.interval,
                KLINE_INTERVALS.join(", ")
            )));
        }
        let limit = clamp_limit(params.limit, 500, 1000);
        self.client
            .get_json(
                "/api/v3/klines",
                &[
                    ("symbol", symbol),
                    ("interval", params.interval),
                    ("limit", limit.to_string()),
                ],
            )
            .await
    }
}
