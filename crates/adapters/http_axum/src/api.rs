//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;

use axum::Router;
use axum::routing::{get, post};

use relayhub_app::ports::Transport;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<T: Transport + 'static>() -> Router<AppState<T>> {
    Router::new()
        .route("/devices", get(devices::list::<T>))
        .route("/devices/{id}", get(devices::get::<T>))
        .route(
            "/devices/{id}/{state}/{command}",
            post(devices::command::<T>),
        )
}
