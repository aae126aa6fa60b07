//! # Utilities Module
//!
//! Small helpers shared by the payload-carrying modules of `lib_common`.
//!
//! ## Contained Modules:
//!
//! - **`base64_bytes`**: a `serde` adapter that carries raw byte payloads
//!   (HTML bodies, event data) as base64 strings inside JSON.
//! - **`timestamps`**: timestamp formatting helpers used when records are
//!   stamped on their way into storage.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Serde adapter for `Vec<u8>` fields encoded as base64 strings.
pub mod base64_bytes;
/// Timestamp formatting helpers.
pub mod timestamps;

pub use timestamps::current_datetime_rfc9557;
