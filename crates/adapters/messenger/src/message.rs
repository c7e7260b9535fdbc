//! Messages exchanged with the remote broker.
//!
//! Every broker message is an envelope `{"id", "data"}` whose `data` is the
//! JSON text of a [`RemoteRequest`] (inbound) or a [`RemoteReply`] (outbound).
//! The `id` is echoed back so the remote side can correlate replies.

use serde::{Deserialize, Serialize};

/// Outer document on the broker topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEnvelope {
    pub id: u64,
    pub data: String,
    /// Where the reply should go; the configured reply topic when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_topic: Option<String>,
}

/// An API call to replay against the local HTTP router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    /// HTTP method; `GET` when empty.
    #[serde(default)]
    pub method: String,
    /// Path below `/api`, e.g. `devices/lounge/volume/set`.
    pub path: String,
    #[serde(default)]
    pub body: String,
}

/// The API response sent back to the remote caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReply {
    /// Status line such as `200 OK`.
    pub status: String,
    pub body: String,
}
