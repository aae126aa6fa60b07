use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::config_file::read_config_file;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Deduplicates weather readings and stores them in PostgreSQL", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "WEATHER_CONSUMER_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "WEATHER_CONSUMER_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "WEATHER_CONSUMER_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "EVENTS_REDIS_URL", help = "Redis URL of the event bus.")]
    pub redis_url: Option<String>,

    #[clap(long, env = "DATABASE_URL", hide_env_values = true, help = "PostgreSQL connection string.")]
    pub database_url: Option<String>,

    #[clap(long, env = "DATABASE_MAX_CONNECTIONS", help = "Maximum pooled database connections.")]
    pub database_max_connections: Option<u32>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            redis_url: other.redis_url.or(self.redis_url),
            database_url: other.database_url.or(self.database_url),
            database_max_connections: other.database_max_connections.or(self.database_max_connections),
        }
    }

    fn resolve(file: Option<Config>, cli: Config) -> Config {
        let mut config = Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            redis_url: Some("redis://127.0.0.1:6379".to_string()),
            database_max_connections: Some(5),
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
        .unwrap_or_else(|| PathBuf::from("weather_consumer.conf"));

    Config::resolve(read_config_file(&config_file_path), cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_wins_over_file() {
        let file: Config =
            serde_json::from_str(r#"{"databaseUrl": "postgres://file/db", "databaseMaxConnections": 2}"#).unwrap();
        let cli = Config::parse_from(["weather_consumer", "--database-url", "postgres://cli/db"]);
        let config = Config::resolve(Some(file), cli);
        assert_eq!(config.database_url.as_deref(), Some("postgres://cli/db"));
        assert_eq!(config.database_max_connections, Some(2));
    }
}
