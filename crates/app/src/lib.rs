//! # relayhub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Transport`: topic publish/subscribe of raw messages
//!   - `DeviceConnection`: session and operations of one physical device
//!   - `ConnectionFactory`: build connections from device configuration
//! - Provide the use-cases built on those ports:
//!   - `MessageBus`: envelope publish/subscribe and request/reply with timeout
//!   - `DeviceCommandRouter`: per-device serialized command execution
//!   - `log_relay`: re-emit log records from the logging topic
//! - Provide **in-process infrastructure** (memory transport) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `relayhub-domain` only (plus `tokio` for tasks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod log_relay;
pub mod message_bus;
pub mod ports;
pub mod router;
pub mod transport;
