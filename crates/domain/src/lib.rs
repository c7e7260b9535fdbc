//! # relayhub-domain
//!
//! Pure domain model for the relayhub home automation hub.
//!
//! ## Responsibilities
//! - Foundational types: error taxonomy, timestamps
//! - Define the **bus envelope** and its codec (command, command result, log)
//! - Define **command payloads** and the per-state command vocabulary
//! - Define **device state snapshots** returned after a command
//! - Define **Devices** as supplied by configuration
//! - Resolve loosely-specified channel, app and input names (**matching**)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod command;
pub mod device;
pub mod envelope;
pub mod log;
pub mod matching;
pub mod media;
pub mod state;
