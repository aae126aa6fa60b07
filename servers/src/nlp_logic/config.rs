use clap::Parser;
use lib_common::nlp::MergePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::config_file::read_config_file;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Document entity and sentiment extraction subscriber", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "NLP_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "NLP_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "NLP_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "EVENTS_REDIS_URL", help = "Redis URL of the event bus.")]
    pub redis_url: Option<String>,

    #[clap(long, env = "NLP_TOPIC", help = "Topic carrying Document and FeedItem events.")]
    pub topic: Option<String>,

    #[clap(long, env = "NLP_OUTPUT_CSV", help = "CSV file the extracted entities are written to.")]
    pub output_csv: Option<PathBuf>,

    #[clap(long, env = "NLP_GAZETTEER", help = "JSON object of surface form to entity label.")]
    pub gazetteer: Option<PathBuf>,

    #[clap(long, env = "NLP_FALLBACK_LABEL", help = "Label for unknown capitalized word runs.")]
    pub fallback_label: Option<String>,

    #[clap(long, env = "NLP_LEXICON", help = "JSON object of word to sentiment weight.")]
    pub lexicon: Option<PathBuf>,

    #[clap(long, env = "NLP_MERGE_POLICY", help = "Duplicate entity policy (last-wins, first-wins).")]
    pub merge_policy: Option<MergePolicy>,

    #[clap(long, env = "NLP_PARALLEL", help = "Analyze paragraphs in parallel.")]
    pub parallel: Option<bool>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            redis_url: other.redis_url.or(self.redis_url),
            topic: other.topic.or(self.topic),
            output_csv: other.output_csv.or(self.output_csv),
            gazetteer: other.gazetteer.or(self.gazetteer),
            fallback_label: other.fallback_label.or(self.fallback_label),
            lexicon: other.lexicon.or(self.lexicon),
            merge_policy: other.merge_policy.or(self.merge_policy),
            parallel: other.parallel.or(self.parallel),
        }
    }

    fn defaults() -> Config {
        Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            redis_url: Some("redis://127.0.0.1:6379".to_string()),
            topic: Some(lib_common::pipelines::DOCUMENTS_TOPIC.to_string()),
            output_csv: Some(PathBuf::from("entities.csv")),
            fallback_label: Some("ENTITY".to_string()),
            merge_policy: Some(MergePolicy::default()),
            parallel: Some(false),
            ..Default::default()
        }
    }

    /// Layers `file` and then `cli` over the defaults.
    fn resolve(file: Option<Config>, cli: Config) -> Config {
        let mut config = Config::defaults();
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
        .unwrap_or_else(|| PathBuf::from("nlp_subscriber.conf"));

    Config::resolve(read_config_file(&config_file_path), cli)
}
