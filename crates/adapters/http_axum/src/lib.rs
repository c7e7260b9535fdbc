//! # relayhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - List the configured devices (`/api/devices`)
//! - Turn `POST /api/devices/{id}/{state}/{command}` into a command request on
//!   the bus and wait for its result
//! - Map command outcomes onto HTTP status codes
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (message bus, transport port) and
//! `relayhub-domain` (payload types). Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
