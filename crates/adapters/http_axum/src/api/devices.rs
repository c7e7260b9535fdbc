//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use relayhub_app::ports::Transport;
use relayhub_domain::command::CommandPayload;
use relayhub_domain::device::Device;
use relayhub_domain::envelope::Envelope;
use relayhub_domain::error::RelayHubError;
use relayhub_domain::state::{Command, DeviceState, StateKind};

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Device>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the command endpoint.
pub enum CommandResponse {
    /// The new state, or `null` for commands that produce none.
    Ok(Json<serde_json::Value>),
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<T: Transport + 'static>(State(state): State<AppState<T>>) -> ListResponse {
    ListResponse::Ok(Json(state.devices.to_vec()))
}

/// `GET /api/devices/{id}`
pub async fn get<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let device = state
        .device(&id)
        .cloned()
        .ok_or(RelayHubError::UnknownDevice(id))?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices/{id}/{state}/{command}`
///
/// The request body, if any, is passed through verbatim as the command
/// detail (JSON text).
pub async fn command<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    Path((id, state_name, command)): Path<(String, String, String)>,
    body: String,
) -> Result<CommandResponse, ApiError> {
    let device = state
        .device(&id)
        .ok_or_else(|| RelayHubError::UnknownDevice(id.clone()))?;
    let kind: StateKind = state_name
        .parse()
        .map_err(|_| ApiError::UnknownState(state_name.clone()))?;
    let verb = command
        .parse::<Command>()
        .ok()
        .filter(|verb| device.supports(kind, *verb))
        .ok_or_else(|| RelayHubError::UnsupportedCommand {
            state: state_name.clone(),
            command: command.clone(),
        })?;

    tracing::debug!(device_id = %id, state = %kind, command = %verb, "relaying command");
    let mut payload = CommandPayload::new(id, kind, verb.as_str());
    if !body.trim().is_empty() {
        payload = payload.with_detail(body);
    }

    let reply = state
        .bus
        .request(
            device.device_type.topic(),
            Envelope::command(payload),
            state.request_timeout,
        )
        .await?;
    let result = reply
        .into_command_result()
        .ok_or(ApiError::UnexpectedReply)?;
    if !result.success {
        return Err(ApiError::CommandFailed(result.error));
    }

    let body = result
        .new_state
        .as_ref()
        .map_or(Ok(serde_json::Value::Null), inner_state)
        .map_err(ApiError::Encode)?;
    Ok(CommandResponse::Ok(Json(body)))
}

/// The state body without its type tag.
fn inner_state(state: &DeviceState) -> Result<serde_json::Value, serde_json::Error> {
    match state {
        DeviceState::Power(inner) => serde_json::to_value(inner),
        DeviceState::Volume(inner) => serde_json::to_value(inner),
        DeviceState::Channel(inner) => serde_json::to_value(inner),
        DeviceState::Input(inner) => serde_json::to_value(inner),
    }
}
