//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use relayhub_domain::error::RelayHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Everything an API endpoint can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// Failure raised before or while exchanging the request on the bus.
    Hub(RelayHubError),
    /// The path names a state outside the known vocabulary.
    UnknownState(String),
    /// The device answered with `success = false`.
    CommandFailed(String),
    /// The reply was not a command result.
    UnexpectedReply,
    /// The new state could not be rendered.
    Encode(serde_json::Error),
}

impl From<RelayHubError> for ApiError {
    fn from(err: RelayHubError) -> Self {
        Self::Hub(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Hub(err) => (hub_status(&err), err.describe()),
            Self::UnknownState(name) => (StatusCode::BAD_REQUEST, format!("unknown state {name:?}")),
            Self::CommandFailed(message) => (StatusCode::BAD_GATEWAY, message),
            Self::UnexpectedReply => (
                StatusCode::BAD_GATEWAY,
                "unexpected reply from device router".to_string(),
            ),
            Self::Encode(err) => {
                tracing::error!(error = %err, "failed to encode device state");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn hub_status(err: &RelayHubError) -> StatusCode {
    match err {
        RelayHubError::UnknownDevice(_) => StatusCode::NOT_FOUND,
        RelayHubError::UnsupportedCommand { .. }
        | RelayHubError::InvalidDetail { .. }
        | RelayHubError::NoMatchFound(_) => StatusCode::BAD_REQUEST,
        RelayHubError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RelayHubError::ConnectionFailure(_) | RelayHubError::DeviceBusy(_) => {
            StatusCode::BAD_GATEWAY
        }
        RelayHubError::Transport(_)
        | RelayHubError::MalformedEnvelope(_)
        | RelayHubError::MalformedPayload { .. } => {
            tracing::error!(error = %err.describe(), "bus failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use relayhub_domain::error::TransportError;

    use super::*;

    #[test]
    fn should_map_hub_errors_to_status_codes() {
        let cases = [
            (RelayHubError::UnknownDevice("x".to_string()), StatusCode::NOT_FOUND),
            (
                RelayHubError::UnsupportedCommand {
                    state: "power".to_string(),
                    command: "toggle".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                RelayHubError::Timeout {
                    topic: "_reply.x".to_string(),
                    after: Duration::from_secs(1),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                RelayHubError::Transport(TransportError::Closed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn should_map_failed_command_to_bad_gateway() {
        let response = ApiError::CommandFailed("connection failure".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
