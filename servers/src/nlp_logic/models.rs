use anyhow::{Context, Result};
use lib_common::nlp::{GazetteerExtractor, LexiconModel};

use super::config::Config;

/// Loads the entity gazetteer, or an empty one tagging only capitalized runs.
pub fn load_extractor(config: &Config) -> Result<GazetteerExtractor> {
    let extractor = match &config.gazetteer {
        Some(path) => GazetteerExtractor::from_json_file(path)
            .with_context(|| format!("loading gazetteer {}", path.display()))?,
        None => {
            log::warn!("No gazetteer configured; only the fallback label will be used.");
            GazetteerExtractor::new(Vec::<(String, String)>::new())
        }
    };
    Ok(match &config.fallback_label {
        Some(label) if !label.is_empty() => extractor.with_fallback_label(label.clone()),
        _ => extractor,
    })
}

/// Restores the sentiment lexicon, or the built-in English one.
pub fn load_scorer(config: &Config) -> Result<LexiconModel> {
    match &config.lexicon {
        Some(path) => LexiconModel::restore(path).with_context(|| format!("loading lexicon {}", path.display())),
        None => Ok(LexiconModel::default_english()),
    }
}
