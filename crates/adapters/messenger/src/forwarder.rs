//! Replays remote requests against the local HTTP router.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::error::MessengerError;
use crate::message::{RemoteEnvelope, RemoteReply, RemoteRequest};

/// A reply envelope and the topic the request asked it to go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub reply_topic: Option<String>,
    pub envelope: RemoteEnvelope,
}

/// Runs remote requests through an in-process [`Router`]; no socket is used.
#[derive(Clone)]
pub struct Forwarder {
    router: Router,
}

impl Forwarder {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Decode a broker message, replay it and build the reply envelope.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Decode`] for malformed messages and
    /// [`MessengerError::Request`] when the request cannot be built.
    pub async fn handle(&self, payload: &[u8]) -> Result<Outgoing, MessengerError> {
        let envelope: RemoteEnvelope =
            serde_json::from_slice(payload).map_err(MessengerError::Decode)?;
        let request: RemoteRequest =
            serde_json::from_str(&envelope.data).map_err(MessengerError::Decode)?;

        let reply = self.forward(&request).await?;
        tracing::debug!(
            id = envelope.id,
            method = %request.method,
            path = %request.path,
            status = %reply.status,
            "remote request relayed"
        );
        let data = serde_json::to_string(&reply).map_err(MessengerError::Encode)?;
        Ok(Outgoing {
            reply_topic: envelope.reply_topic,
            envelope: RemoteEnvelope {
                id: envelope.id,
                data,
                reply_topic: None,
            },
        })
    }

    /// Issue `request` against `/api/<path>` and capture status and body.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Request`] for an invalid method or path, or
    /// [`MessengerError::Body`] if the response body cannot be read.
    pub async fn forward(&self, request: &RemoteRequest) -> Result<RemoteReply, MessengerError> {
        let method = if request.method.is_empty() {
            "GET"
        } else {
            request.method.as_str()
        };
        let http_request = Request::builder()
            .method(method)
            .uri(format!("/api/{}", request.path.trim_start_matches('/')))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(request.body.clone()))
            .map_err(MessengerError::Request)?;

        let response = match self.router.clone().oneshot(http_request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(MessengerError::Body)?
            .to_bytes();
        Ok(RemoteReply {
            status: status_line(status),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Path;
    use axum::routing::{get, post};

    use super::*;

    fn router() -> Router {
        Router::new().nest(
            "/api",
            Router::new()
                .route("/devices", get(|| async { "[]" }))
                .route(
                    "/devices/{id}/volume/set",
                    post(|Path(id): Path<String>, body: String| async move {
                        format!("{id}:{body}")
                    }),
                ),
        )
    }

    fn envelope(id: u64, request: &RemoteRequest) -> Vec<u8> {
        serde_json::to_vec(&RemoteEnvelope {
            id,
            data: serde_json::to_string(request).unwrap(),
            reply_topic: Some("callers/1".to_string()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn should_replay_request_with_method_path_and_body() {
        let forwarder = Forwarder::new(router());
        let reply = forwarder
            .forward(&RemoteRequest {
                method: "POST".to_string(),
                path: "devices/lounge/volume/set".to_string(),
                body: "42".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(reply.status, "200 OK");
        assert_eq!(reply.body, "lounge:42");
    }

    #[tokio::test]
    async fn should_default_to_get_and_accept_leading_slash() {
        let forwarder = Forwarder::new(router());
        let reply = forwarder
            .forward(&RemoteRequest {
                method: String::new(),
                path: "/devices".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(reply.status, "200 OK");
        assert_eq!(reply.body, "[]");
    }

    #[tokio::test]
    async fn should_report_status_of_unknown_route() {
        let forwarder = Forwarder::new(router());
        let reply = forwarder
            .forward(&RemoteRequest {
                method: "GET".to_string(),
                path: "nowhere".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(reply.status, "404 Not Found");
    }

    #[tokio::test]
    async fn should_echo_id_and_reply_topic() {
        let forwarder = Forwarder::new(router());
        let request = RemoteRequest {
            method: "GET".to_string(),
            path: "devices".to_string(),
            body: String::new(),
        };

        let outgoing = forwarder.handle(&envelope(7, &request)).await.unwrap();

        assert_eq!(outgoing.reply_topic.as_deref(), Some("callers/1"));
        assert_eq!(outgoing.envelope.id, 7);
        let reply: RemoteReply = serde_json::from_str(&outgoing.envelope.data).unwrap();
        assert_eq!(reply.body, "[]");
    }

    #[tokio::test]
    async fn should_reject_malformed_message() {
        let forwarder = Forwarder::new(router());
        let result = forwarder.handle(b"not json").await;
        assert!(matches!(result, Err(MessengerError::Decode(_))));
    }

    #[tokio::test]
    async fn should_reject_invalid_method() {
        let forwarder = Forwarder::new(router());
        let request = RemoteRequest {
            method: "NOT A METHOD".to_string(),
            path: "devices".to_string(),
            body: String::new(),
        };
        let result = forwarder.handle(&envelope(1, &request)).await;
        assert!(matches!(result, Err(MessengerError::Request(_))));
    }
}
