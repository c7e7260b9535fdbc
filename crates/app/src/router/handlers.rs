//! State handlers: turn a validated command into device operations and read
//! back the resulting state.

use std::time::Duration;

use relayhub_domain::command::{CommandPayload, SetChannelDetail};
use relayhub_domain::error::{DetailError, DeviceError, RelayHubError};
use relayhub_domain::matching::{match_app, match_channel, match_input};
use relayhub_domain::state::{
    ChannelState, Command, DeviceState, InputState, PowerState, StateKind, VolumeState,
};

use super::worker::{Outcome, Session, bounded};
use crate::ports::DeviceConnection;

const MAX_VOLUME: u8 = 100;

/// Execute one command against the session.
///
/// Commands the device does not declare are rejected up front. Every command
/// except power-on then establishes the session; when that fails no device
/// operation is attempted. Operations the device type does
/// not implement are reported as unsupported commands.
#[tracing::instrument(
    skip(session, command),
    fields(device_id = %command.device_id, state = %command.state, command = %command.command)
)]
pub(super) async fn execute<C: DeviceConnection>(
    session: &mut Session<C>,
    command: &CommandPayload,
) -> Outcome {
    let verb = command.verb()?;
    if !session.supports(command.state, verb) {
        tracing::debug!("command not declared by device");
        return Err(unsupported(command));
    }
    let outcome = if command.state == StateKind::Power && verb == Command::On {
        power_on(session).await
    } else {
        match session.connect().await {
            Ok(()) => dispatch(session, command, verb).await,
            Err(err) => Err(err),
        }
    };
    outcome.map_err(|err| match err {
        RelayHubError::ConnectionFailure(DeviceError::NotCapable { operation }) => {
            tracing::debug!(operation, "device type lacks operation");
            unsupported(command)
        }
        other => other,
    })
}

async fn dispatch<C: DeviceConnection>(
    session: &mut Session<C>,
    command: &CommandPayload,
    verb: Command,
) -> Outcome {
    let timeout = session.config.operation_timeout;
    let conn = &mut session.connection;
    match command.state {
        StateKind::Power if verb == Command::Off => {
            bounded(timeout, conn.power_off()).await?;
            Ok(Some(DeviceState::Power(PowerState { power_on: false })))
        }
        StateKind::Power => Err(unsupported(command)),
        StateKind::Volume => volume(conn, timeout, command, verb).await,
        StateKind::Channel => channel(conn, timeout, command, verb).await,
        StateKind::Playback => playback(conn, timeout, command, verb).await,
        StateKind::Input => input(conn, timeout, command, verb).await,
    }
}

/// Wake the device, then poll the handshake until it answers.
async fn power_on<C: DeviceConnection>(session: &mut Session<C>) -> Outcome {
    bounded(
        session.config.operation_timeout,
        session.connection.power_on(),
    )
    .await?;

    let mut last_error = None;
    for attempt in 1..=session.config.power_on_attempts {
        tokio::time::sleep(session.config.power_on_interval).await;
        match session
            .handshake(session.config.power_on_handshake_timeout)
            .await
        {
            Ok(()) => {
                tracing::debug!(attempt, "device is up");
                return Ok(Some(DeviceState::Power(PowerState { power_on: true })));
            }
            Err(err) => {
                tracing::debug!(attempt, error = %err.describe(), "device not up yet");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        DeviceError::Unreachable("device did not come up after power on".to_string()).into()
    }))
}

async fn volume<C: DeviceConnection>(
    conn: &mut C,
    timeout: Duration,
    command: &CommandPayload,
    verb: Command,
) -> Outcome {
    match verb {
        Command::Up => bounded(timeout, conn.volume_up()).await?,
        Command::Down => bounded(timeout, conn.volume_down()).await?,
        Command::Set => {
            let level = clamp_volume(command.detail_as::<i64>()?);
            bounded(timeout, conn.set_volume(level)).await?;
        }
        Command::Adjust => {
            let delta = command.detail_as::<i64>()?;
            let current = bounded(timeout, conn.get_volume()).await?;
            let level = clamp_volume(i64::from(current).saturating_add(delta));
            bounded(timeout, conn.set_volume(level)).await?;
        }
        Command::SetMute => {
            let muted = command.detail_as_bool()?;
            bounded(timeout, conn.set_mute(muted)).await?;
        }
        _ => return Err(unsupported(command)),
    }

    let volume = bounded(timeout, conn.get_volume()).await?;
    let is_muted = bounded(timeout, conn.get_mute()).await?;
    Ok(Some(DeviceState::Volume(VolumeState { volume, is_muted })))
}

async fn channel<C: DeviceConnection>(
    conn: &mut C,
    timeout: Duration,
    command: &CommandPayload,
    verb: Command,
) -> Outcome {
    match verb {
        Command::Up => bounded(timeout, conn.channel_up()).await?,
        Command::Down => bounded(timeout, conn.channel_down()).await?,
        Command::Set => set_channel(conn, timeout, command).await?,
        Command::Adjust => {
            let delta = command.detail_as::<i64>()?;
            let current = bounded(timeout, conn.current_channel()).await?;
            let number = clamp_channel(i64::from(current.number).saturating_add(delta));
            bounded(timeout, conn.set_channel(number)).await?;
        }
        _ => return Err(unsupported(command)),
    }

    let current = bounded(timeout, conn.current_channel()).await?;
    Ok(Some(DeviceState::Channel(ChannelState {
        channel_number: current.number,
        channel_name: current.name,
    })))
}

/// Launch the app a free-text identifier names, otherwise tune to the best
/// channel match.
async fn set_channel<C: DeviceConnection>(
    conn: &mut C,
    timeout: Duration,
    command: &CommandPayload,
) -> Result<(), RelayHubError> {
    let detail: SetChannelDetail = command.detail_as()?;
    if !detail.is_exact() && detail.identifier().is_none() {
        return Err(command.invalid(DetailError::EmptyIdentifier));
    }

    if let Some(query) = app_query(&detail) {
        if let Some(app_id) = closest_app(conn, timeout, query).await? {
            tracing::debug!(app_id = %app_id, "identifier names an installed app");
            return bounded(timeout, conn.launch_app(&app_id)).await;
        }
    }

    let channels = bounded(timeout, conn.list_channels()).await?;
    let number = match_channel(&detail, &channels)?.item.number;
    bounded(timeout, conn.set_channel(number)).await
}

/// Only free-text identifiers are looked up as apps, never exact or numeric
/// requests.
fn app_query(detail: &SetChannelDetail) -> Option<&str> {
    if detail.is_exact() {
        return None;
    }
    detail
        .identifier()
        .filter(|id| id.trim().parse::<i64>().is_err())
}

async fn closest_app<C: DeviceConnection>(
    conn: &mut C,
    timeout: Duration,
    query: &str,
) -> Result<Option<String>, RelayHubError> {
    let apps = match bounded(timeout, conn.list_apps()).await {
        Ok(apps) => apps,
        Err(RelayHubError::ConnectionFailure(DeviceError::NotCapable { .. })) => return Ok(None),
        Err(err) => return Err(err),
    };
    Ok(match_app(query, &apps).ok().map(|m| m.item.id.clone()))
}

async fn playback<C: DeviceConnection>(
    conn: &mut C,
    timeout: Duration,
    command: &CommandPayload,
    verb: Command,
) -> Outcome {
    match verb {
        Command::Play => bounded(timeout, conn.play()).await?,
        Command::Pause => bounded(timeout, conn.pause()).await?,
        Command::Rewind => bounded(timeout, conn.rewind()).await?,
        Command::FastForward => bounded(timeout, conn.fast_forward()).await?,
        _ => return Err(unsupported(command)),
    }
    Ok(None)
}

async fn input<C: DeviceConnection>(
    conn: &mut C,
    timeout: Duration,
    command: &CommandPayload,
    verb: Command,
) -> Outcome {
    if verb != Command::Set {
        return Err(unsupported(command));
    }
    let target: String = command.detail_as()?;
    if target.trim().is_empty() {
        return Err(command.invalid(DetailError::EmptyIdentifier));
    }

    let inputs = bounded(timeout, conn.list_inputs()).await?;
    let input_id = match_input(&target, &inputs)?.item.id.clone();
    bounded(timeout, conn.switch_input(&input_id)).await?;
    Ok(Some(DeviceState::Input(InputState {
        input_name: input_id,
    })))
}

fn unsupported(command: &CommandPayload) -> RelayHubError {
    RelayHubError::UnsupportedCommand {
        state: command.state.to_string(),
        command: command.command.clone(),
    }
}

fn clamp_volume(level: i64) -> u8 {
    u8::try_from(level.clamp(0, i64::from(MAX_VOLUME))).unwrap_or(MAX_VOLUME)
}

fn clamp_channel(number: i64) -> u32 {
    u32::try_from(number.max(0)).unwrap_or(u32::MAX)
}
