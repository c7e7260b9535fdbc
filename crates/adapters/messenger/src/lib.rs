//! # relayhub-adapter-messenger
//!
//! Remote access to the hub through an MQTT broker: API calls published on
//! the hub's subject are replayed against the local HTTP router and the
//! response is published back.
//!
//! ## Topics
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `<subject>` | broker to hub | [`RemoteEnvelope`] carrying a [`RemoteRequest`] |
//! | envelope `reply_topic`, else `<subject>/reply` | hub to broker | [`RemoteEnvelope`] carrying a [`RemoteReply`] |
//!
//! ## Dependency rule
//!
//! Depends on the HTTP router type only; it never touches the domain or the
//! command router directly.

mod broker;
mod config;
mod error;
mod forwarder;
mod message;

pub use broker::{MessengerHandle, launch};
pub use config::MessengerConfig;
pub use error::MessengerError;
pub use forwarder::{Forwarder, Outgoing};
pub use message::{RemoteEnvelope, RemoteReply, RemoteRequest};
