//! Re-emits log records published on the logging topic.

use relayhub_domain::envelope::{Message, TOPIC_LOGGING};
use relayhub_domain::error::RelayHubError;
use relayhub_domain::log::{LogLevel, LogPayload};

use crate::message_bus::{MessageBus, SubscriptionHandle};
use crate::ports::Transport;

/// Where relayed log records end up.
pub trait LogSink: Send + Sync + 'static {
    fn write(&self, record: &LogPayload);
}

/// Writes records to the process-wide `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn write(&self, record: &LogPayload) {
        let remote_timestamp = record.timestamp.to_rfc3339();
        match record.level {
            LogLevel::Info => {
                tracing::info!(target: "relayhub::relay", %remote_timestamp, "{}", record.message);
            }
            LogLevel::Warn => {
                tracing::warn!(target: "relayhub::relay", %remote_timestamp, "{}", record.message);
            }
            LogLevel::Error => {
                tracing::error!(target: "relayhub::relay", %remote_timestamp, "{}", record.message);
            }
        }
    }
}

/// Subscribe to [`TOPIC_LOGGING`] and hand every log record to `sink`.
///
/// Envelopes of other types on the topic are ignored.
///
/// # Errors
///
/// Returns [`RelayHubError::Transport`] if the subscription fails.
pub async fn launch<T, S>(bus: &MessageBus<T>, sink: S) -> Result<SubscriptionHandle, RelayHubError>
where
    T: Transport + 'static,
    S: LogSink,
{
    let handle = bus
        .subscribe(TOPIC_LOGGING, move |envelope| {
            if let Message::Log(record) = &envelope.message {
                sink.write(record);
            }
            async {}
        })
        .await?;
    tracing::info!("log relay started");
    Ok(handle)
}
