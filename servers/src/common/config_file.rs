use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Reads a JSON config file. A missing or malformed file is logged and
/// yields `None` so the caller falls back to defaults and env/CLI values.
pub fn read_config_file<C: DeserializeOwned>(path: &Path) -> Option<C> {
    if !path.exists() {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            path.display()
        );
        return None;
    }

    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<C>(&config_str) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}
