//! `riftwalk-middleware` – in-process message routing.
//!
//! Routes commands and perception output between the robot facade and the
//! outside world without caring about the data's meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.
//! - [`rosbridge`] – rosbridge-style JSON encoding of bus events for an
//!   external transport bridge.

pub mod bus;
pub mod rosbridge;

pub use bus::{EventBus, Topic, TopicReceiver};
