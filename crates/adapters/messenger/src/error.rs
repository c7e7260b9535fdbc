//! Messenger adapter error types.

/// Errors specific to the remote messenger.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// An incoming message is not a valid remote envelope or request.
    #[error("failed to decode remote message")]
    Decode(#[source] serde_json::Error),

    /// A reply could not be encoded.
    #[error("failed to encode remote reply")]
    Encode(#[source] serde_json::Error),

    /// The remote request does not form a valid HTTP request.
    #[error("invalid remote request")]
    Request(#[source] axum::http::Error),

    /// The API response body could not be read.
    #[error("failed to read API response")]
    Body(#[source] axum::Error),
}
