//! # Event Bus Module
//!
//! Topic-based publish/subscribe plumbing shared by the producers and
//! consumers in `servers`.
//!
//! ## Core Components:
//!
//! - **`event`**: the [`Event`] envelope (id, type name and version,
//!   mimetype, opaque payload, creation time) and its JSON wire form.
//! - **`bus`**: the [`EventBus`] trait, the [`Subscription`] stream handed to
//!   consumers and the in-process [`LocalBus`].
//! - **`redis_bus`**: [`RedisBus`], the networked bus over Redis pub/sub.
//! - **`router`**: the [`Router`] that connects [`Handler`]s from an input
//!   topic to an output topic.
//!
//! Delivery is at-most-once: events published while nobody is subscribed
//! are not retained.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Bus trait, subscriptions and the in-process bus.
pub mod bus;
/// Error type for publishing, subscribing and payload decoding.
pub mod error;
/// The event envelope.
pub mod event;
/// Redis pub/sub bus.
pub mod redis_bus;
/// Topic-to-topic handler routing.
pub mod router;

pub use bus::{EventBus, LocalBus, Subscription};
pub use error::BusError;
pub use event::{Event, MIME_JSON};
pub use redis_bus::RedisBus;
pub use router::{handler_fn, FnHandler, Handler, Router};
