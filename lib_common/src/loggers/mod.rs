//! # Loggers Module
//!
//! Logging backend shared by every binary. Library code logs through the
//! `log` facade only; binaries call [`setup_logging`] once at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// fern dispatch setup and log file rotation.
pub mod dispatch;

pub use dispatch::{parse_level, rotate_logs, setup_logging, LoggingError};
