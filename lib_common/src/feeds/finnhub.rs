//! # Finnhub Trades Feed
//!
//! Message shapes of the Finnhub trades WebSocket
//! (`wss://ws.finnhub.io?token=...`). The server pushes `trade` messages with
//! a batch of ticks and periodic `ping` keep-alives.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::feeds::error::FeedError;

/// Finnhub WebSocket endpoint.
pub const FINNHUB_WSS_URL: &str = "wss://ws.finnhub.io";
/// Event type name used for published trade batches.
pub const TRADES_EVENT_TYPE: &str = "Generic";

/// One trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTick {
    /// Symbol.
    #[serde(rename = "s")]
    pub symbol: String,
    /// Last price.
    #[serde(rename = "p")]
    pub price: f64,
    /// Unix milliseconds.
    #[serde(rename = "t")]
    pub timestamp: u64,
    /// Trade conditions, when the exchange reports any.
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

/// A single message from the socket; one message may carry many ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradesResponse {
    /// `trade`, `ping` or an error notice.
    #[serde(rename = "type")]
    pub kind: String,
    /// Ticks; empty for keep-alives.
    #[serde(default)]
    pub data: Vec<TradeTick>,
}

impl TradesResponse {
    /// Whether this message carries trades.
    pub fn is_trade(&self) -> bool {
        self.kind == "trade"
    }

    /// Whether this message is a keep-alive.
    pub fn is_ping(&self) -> bool {
        self.kind == "ping"
    }
}

/// Decodes one text frame.
pub fn parse_message(text: &str) -> Result<TradesResponse, FeedError> {
    Ok(serde_json::from_str(text)?)
}

/// The frame that subscribes the connection to `symbol`.
pub fn subscribe_message(symbol: &str) -> String {
    json!({ "type": "subscribe", "symbol": symbol }).to_string()
}

/// Full connection URL for `api_key`.
pub fn connect_url(base: &str, api_key: &str) -> Result<String, FeedError> {
    if api_key.is_empty() {
        return Err(FeedError::MissingKey("FINNHUB_KEY"));
    }
    Ok(format!("{}?token={}", base.trim_end_matches('/'), api_key))
}
