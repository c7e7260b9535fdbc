//! Timestamp helpers for log payloads.

use chrono::{DateTime, Utc};

/// UTC timestamp carried by log envelopes.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
