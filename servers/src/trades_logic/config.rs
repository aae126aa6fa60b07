use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::config_file::read_config_file;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Streams Finnhub trades onto the event bus", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "TRADES_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "TRADES_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "TRADES_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "EVENTS_REDIS_URL", help = "Redis URL of the event bus.")]
    pub redis_url: Option<String>,

    #[clap(long, env = "FINNHUB_KEY", hide_env_values = true, help = "Finnhub API key.")]
    pub api_key: Option<String>,

    #[clap(long, env = "FINNHUB_SYMBOLS", value_delimiter = ',', help = "Comma separated symbols to subscribe to.")]
    pub symbols: Option<Vec<String>>,

    #[clap(long, env = "FINNHUB_URL", help = "Finnhub WebSocket endpoint.")]
    pub wss_url: Option<String>,

    #[clap(long, env = "FINNHUB_RECONNECT_SECONDS", help = "Seconds to wait before reconnecting.")]
    pub reconnect_seconds: Option<u64>,

    #[clap(long, env = "FINNHUB_ANNOUNCE", help = "Also subscribe to the trades topic and log every batch.")]
    pub announce: Option<bool>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            redis_url: other.redis_url.or(self.redis_url),
            api_key: other.api_key.or(self.api_key),
            symbols: other.symbols.or(self.symbols),
            wss_url: other.wss_url.or(self.wss_url),
            reconnect_seconds: other.reconnect_seconds.or(self.reconnect_seconds),
            announce: other.announce.or(self.announce),
        }
    }

    fn resolve(file: Option<Config>, cli: Config) -> Config {
        let mut config = Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            redis_url: Some("redis://127.0.0.1:6379".to_string()),
            symbols: Some(["AAPL", "AMZN", "PCG", "SNAP"].iter().map(|s| s.to_string()).collect()),
            wss_url: Some(lib_common::feeds::finnhub::FINNHUB_WSS_URL.to_string()),
            reconnect_seconds: Some(10),
            announce: Some(false),
            ..Default::default()
        };
        if let Some(file_config) = file {
            config = config.merge(file_config);
        }
        config.merge(cli)
    }
}

pub fn load_config() -> Config {
    let cli = Config::parse();
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("trades_publisher.conf"));

    Config::resolve(read_config_file(&config_file_path), cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_split_on_commas() {
        let cli = Config::parse_from(["trades_publisher", "--symbols", "MSFT,TSLA"]);
        let config = Config::resolve(None, cli);
        assert_eq!(config.symbols, Some(vec!["MSFT".to_string(), "TSLA".to_string()]));
    }

    #[test]
    fn test_default_symbols() {
        let config = Config::resolve(None, Config::default());
        assert_eq!(config.symbols.map(|s| s.len()), Some(4));
        assert_eq!(config.reconnect_seconds, Some(10));
    }
}
