//! # lib_common
//!
//! Building blocks for small event-driven data pipelines: producers pull
//! from external feeds and publish typed events; consumers route, enrich and
//! persist them. Every module sits behind a Cargo feature of the same name
//! (`full` enables all of them).

#[cfg(feature = "connections")]
pub mod connections;
#[cfg(feature = "events")]
pub mod events;
#[cfg(feature = "feeds")]
pub mod feeds;
#[cfg(feature = "ingestors")]
pub mod ingestors;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "nlp")]
pub mod nlp;
#[cfg(feature = "pipelines")]
pub mod pipelines;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "utils")]
pub mod utils;
