use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::config_file::read_config_file;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Publishes current weather readings to the event bus", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "WEATHER_PRODUCER_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "WEATHER_PRODUCER_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "WEATHER_PRODUCER_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "EVENTS_REDIS_URL", help = "Redis URL of the event bus.")]
    pub redis_url: Option<String>,

    #[clap(long, env = "WAPIKEY", hide_env_values = true, help = "WeatherAPI key.")]
    pub api_key: Option<String>,

    #[clap(long, env = "WEATHER_LOCATION", help = "Location queried on every poll.")]
    pub location: Option<String>,

    #[clap(long, env = "WEATHER_POLL_SECONDS", help = "Seconds between polls.")]
    pub poll_seconds: Option<u64>,
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
            location: other.location.or(self.location),
            poll_seconds: other.poll_seconds.or(self.poll_seconds),
        }
    }

    fn resolve(file: Option<Config>, cli: Config) -> Config {
        let mut config = Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            redis_url: Some("redis://127.0.0.1:6379".to_string()),
            location: Some("Washington DC".to_string()),
            poll_seconds: Some(5),
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
        .unwrap_or_else(|| PathBuf::from("weather_producer.conf"));

    Config::resolve(read_config_file(&config_file_path), cli)
}
