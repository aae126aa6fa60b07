//! Process-wide `log` backend: colored console output plus one timestamped
//! file per run, with older files of the same application removed.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use glob::glob;
use log::{Level, LevelFilter};
use thiserror::Error;

/// Failures while installing the logger.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory or file could not be created.
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),
    /// Another logger is already installed.
    #[error("logger already initialized: {0}")]
    AlreadyInitialized(#[from] log::SetLoggerError),
    /// The rotation pattern was invalid.
    #[error("invalid log pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Maps a level name to a filter. Unknown names mean `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" | "warning" => LevelFilter::Warn,
        "error" | "fatal" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// `<app>_<YYYY-MM-DD_HH-MM-SS>.log`
pub fn log_file_name(app: &str) -> String {
    format!("{}_{}.log", app, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Glob matching the timestamp part of [`log_file_name`].
const TIMESTAMP_GLOB: &str = "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]_[0-9][0-9]-[0-9][0-9]-[0-9][0-9]";

fn colored_level(level: Level) -> colored::ColoredString {
    let name = level.as_str();
    match level {
        Level::Error => name.red().bold(),
        Level::Warn => name.yellow(),
        Level::Info => name.green(),
        Level::Debug => name.blue(),
        Level::Trace => name.truecolor(128, 128, 128),
    }
}

/// Installs the global logger for `app`.
///
/// Lines go to stdout (level colored) and to a new file in `log_dir`, which
/// is created if needed. Afterwards only the newest `<app>_*.log` file is
/// kept. Returns the path of the file being written.
pub fn setup_logging(app: &str, log_dir: &Path, level: &str) -> Result<PathBuf, LoggingError> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file_name(app));
    let level = parse_level(level);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                colored_level(record.level()),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S%.3f]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(fern::log_file(&log_path)?);

    fern::Dispatch::new()
        .level(level)
        .level_for("sqlx", LevelFilter::Warn.min(level))
        .level_for("tungstenite", LevelFilter::Warn.min(level))
        .chain(console)
        .chain(file)
        .apply()?;

    let removed = rotate_logs(app, log_dir)?;
    log::debug!("Logging to {} ({} old file(s) removed)", log_path.display(), removed);
    Ok(log_path)
}

/// Deletes every `<app>_<timestamp>.log` in `log_dir` except the newest by
/// name. Logs of apps whose name merely starts with `<app>_` are left alone.
/// Returns the number of files removed.
pub fn rotate_logs(app: &str, log_dir: &Path) -> Result<usize, LoggingError> {
    let pattern = log_dir.join(format!("{}_{}.log", glob::Pattern::escape(app), TIMESTAMP_GLOB));
    let mut log_files: Vec<PathBuf> = glob(&pattern.to_string_lossy())?
        .filter_map(Result::ok)
        .collect();

    // Timestamped names sort chronologically.
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old_file in log_files.iter().skip(1) {
        match fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), LevelFilter::Trace);
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("fatal"), LevelFilter::Error);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
        assert_eq!(parse_level(""), LevelFilter::Info);
    }

    #[test]
    fn test_log_file_name_shape() {
        let name = log_file_name("nlp_subscriber");
        assert!(name.starts_with("nlp_subscriber_"));
        assert!(name.ends_with(".log"));
        // nlp_subscriber_ + YYYY-MM-DD_HH-MM-SS + .log
        assert_eq!(name.len(), "nlp_subscriber_".len() + 19 + 4);
    }

    #[test]
    fn test_rotation_keeps_newest_of_same_app() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "weather_consumer_2024-01-01_00-00-00.log",
            "weather_consumer_2024-03-01_00-00-00.log",
            "weather_consumer_2024-02-01_00-00-00.log",
            "weather_producer_2024-01-01_00-00-00.log",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let removed = rotate_logs("weather_consumer", dir.path()).unwrap();
        assert_eq!(removed, 2);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec![
                "notes.txt",
                "weather_consumer_2024-03-01_00-00-00.log",
                "weather_producer_2024-01-01_00-00-00.log",
            ]
        );
    }

    #[test]
    fn test_rotation_ignores_apps_sharing_a_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "weather_2024-01-01_00-00-00.log",
            "weather_2024-02-01_00-00-00.log",
            "weather_consumer_2024-01-01_00-00-00.log",
            "weather_consumer_2024-02-01_00-00-00.log",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        assert_eq!(rotate_logs("weather", dir.path()).unwrap(), 1);
        assert!(!dir.path().join("weather_2024-01-01_00-00-00.log").exists());
        assert!(dir.path().join("weather_2024-02-01_00-00-00.log").exists());
        assert!(dir.path().join("weather_consumer_2024-01-01_00-00-00.log").exists());
        assert!(dir.path().join("weather_consumer_2024-02-01_00-00-00.log").exists());
    }

    #[test]
    fn test_rotation_on_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(rotate_logs("app", dir.path()).unwrap(), 0);
    }
}
