//! # Finnhub Trades WSS Ingestor
//!
//! WebSocket ingestor for the Finnhub real-time trades stream. Each `trade`
//! message is republished unchanged (as a `Generic` v1 JSON event) on the
//! `trades` topic; `ping` keep-alives are dropped.
//!
//! The connection is re-established after a fixed delay whenever it fails,
//! closes, or stays silent longer than the inactivity timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};

use crate::events::{Event, EventBus};
use crate::feeds::finnhub::{self, TradesResponse, FINNHUB_WSS_URL, TRADES_EVENT_TYPE};

/// Topic trade batches are published to.
pub const TRADES_TOPIC: &str = "trades";

/// Connection settings for the trades stream.
#[derive(Debug, Clone)]
pub struct TradesConfig {
    /// Endpoint without the token query.
    pub wss_url: String,
    /// Finnhub API key.
    pub api_key: String,
    /// Symbols subscribed on every (re)connect.
    pub symbols: Vec<String>,
    /// Wait before reconnecting.
    pub reconnect_delay: Duration,
    /// Silence after which the connection is considered dead.
    pub silent_failure_timeout: Duration,
}

impl Default for TradesConfig {
    fn default() -> Self {
        Self {
            wss_url: FINNHUB_WSS_URL.to_string(),
            api_key: String::new(),
            symbols: ["AAPL", "AMZN", "PCG", "SNAP"].iter().map(|s| s.to_string()).collect(),
            reconnect_delay: Duration::from_secs(10),
            silent_failure_timeout: Duration::from_secs(60),
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connection ended.
enum Disconnect {
    Shutdown,
    Retry,
}

/// # Trades WSS Ingestor
pub struct TradesWssIngestor {
    config: TradesConfig,
    bus: Arc<dyn EventBus>,
    topic: String,
}

impl TradesWssIngestor {
    /// Creates an ingestor publishing to [`TRADES_TOPIC`].
    pub fn new(config: TradesConfig, bus: Arc<dyn EventBus>) -> Self {
        Self {
            config,
            bus,
            topic: TRADES_TOPIC.to_string(),
        }
    }

    /// Streams until `shutdown` fires, reconnecting as needed.
    ///
    /// # Errors
    /// Fails immediately if no API key is configured.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), crate::feeds::FeedError> {
        let url = finnhub::connect_url(&self.config.wss_url, &self.config.api_key)?;

        loop {
            log::info!("Connecting to Finnhub WSS: {}", self.config.wss_url);

            let outcome = tokio::select! {
                _ = shutdown.recv() => Disconnect::Shutdown,
                connected = connect_async(url.as_str()) => match connected {
                    Ok((ws_stream, _)) => self.stream(ws_stream, &mut shutdown).await,
                    Err(e) => {
                        log::error!("Failed to connect to Finnhub: {}", e);
                        Disconnect::Retry
                    }
                }
            };

            if let Disconnect::Shutdown = outcome {
                log::info!("Trades ingestor stopped.");
                return Ok(());
            }

            log::info!("Reconnecting in {}s...", self.config.reconnect_delay.as_secs());
            tokio::select! {
                _ = shutdown.recv() => {
                    log::info!("Trades ingestor stopped.");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
    }

    async fn stream(&self, ws_stream: WsStream, shutdown: &mut broadcast::Receiver<()>) -> Disconnect {
        log::info!("Connected to Finnhub.");
        let (mut write, mut read) = ws_stream.split();

        for symbol in &self.config.symbols {
            if let Err(e) = write.send(Message::Text(finnhub::subscribe_message(symbol).into())).await {
                log::error!("Failed to subscribe to {}: {}", symbol, e);
                return Disconnect::Retry;
            }
            log::debug!("Subscribed to {}", symbol);
        }

        let mut last_activity = Instant::now();
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Disconnect::Shutdown;
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        self.handle_text(&text).await;
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Ok(Message::Close(frame))) => {
                        log::warn!("Finnhub closed the stream: {:?}", frame);
                        return Disconnect::Retry;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::error!("WSS read error: {}", e);
                        return Disconnect::Retry;
                    }
                    None => {
                        log::warn!("WSS stream closed by remote host.");
                        return Disconnect::Retry;
                    }
                },
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    if last_activity.elapsed() > self.config.silent_failure_timeout {
                        log::warn!(
                            "Inactivity timeout ({}s). Reconnecting...",
                            self.config.silent_failure_timeout.as_secs()
                        );
                        return Disconnect::Retry;
                    }
                }
            }
        }
    }

    /// Decodes one text frame and publishes it if it carries trades.
    async fn handle_text(&self, text: &str) {
        let message = match finnhub::parse_message(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                return;
            }
        };
        self.publish(&message).await;
    }

    async fn publish(&self, message: &TradesResponse) {
        if message.is_ping() {
            return;
        }
        if !message.is_trade() {
            log::debug!("Ignoring '{}' message", message.kind);
            return;
        }

        let event = match Event::json(TRADES_EVENT_TYPE, 1, message) {
            Ok(event) => event,
            Err(e) => {
                log::error!("Could not encode trades: {}", e);
                return;
            }
        };
        if let Err(e) = self.bus.publish(&self.topic, &event).await {
            log::error!("Cannot publish trades: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LocalBus;
    use tokio::time::timeout;

    fn ingestor(bus: Arc<LocalBus>) -> TradesWssIngestor {
        TradesWssIngestor::new(
            TradesConfig {
                api_key: "test".into(),
                ..Default::default()
            },
            bus,
        )
    }

    #[tokio::test]
    async fn test_trade_frames_are_published_and_pings_dropped() {
        let bus = Arc::new(LocalBus::default());
        let mut sub = bus.subscribe(TRADES_TOPIC).await.unwrap();
        let ingestor = ingestor(bus.clone());

        ingestor.handle_text(r#"{"type":"ping"}"#).await;
        ingestor.handle_text("{broken").await;
        ingestor
            .handle_text(r#"{"type":"trade","data":[{"s":"AAPL","p":170.5,"t":1700000000000}]}"#)
            .await;

        let event = timeout(Duration::from_secs(1), sub.next()).await.unwrap().unwrap();
        assert_eq!(event.type_name, TRADES_EVENT_TYPE);
        assert_eq!(event.type_version, 1);
        let trades: TradesResponse = event.decode_json().unwrap();
        assert_eq!(trades.data[0].symbol, "AAPL");
        assert!(timeout(Duration::from_millis(50), sub.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let ingestor = TradesWssIngestor::new(TradesConfig::default(), Arc::new(LocalBus::default()));
        let (_tx, rx) = broadcast::channel(1);
        assert!(ingestor.run(rx).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_during_backoff() {
        let bus = Arc::new(LocalBus::default());
        let ingestor = TradesWssIngestor::new(
            TradesConfig {
                wss_url: "ws://127.0.0.1:1".into(),
                api_key: "test".into(),
                reconnect_delay: Duration::from_secs(30),
                ..Default::default()
            },
            bus,
        );
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move { ingestor.run(rx).await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(()).unwrap();
        let result = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
