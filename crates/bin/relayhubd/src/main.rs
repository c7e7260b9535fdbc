//! # relayhubd: relayhub daemon
//!
//! Composition root that wires all components together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the in-process transport and the message bus
//! - Start the log relay and the device command router
//! - Build the axum router and serve it until SIGTERM/SIGINT
//! - Relay remote API calls from the MQTT broker when enabled
//! - Drain device workers on shutdown
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use relayhub_adapter_http_axum::state::AppState;
use relayhub_adapter_messenger::Forwarder;
use relayhub_adapter_virtual::VirtualConnectionFactory;
use relayhub_app::log_relay::{self, TracingLogSink};
use relayhub_app::message_bus::MessageBus;
use relayhub_app::router::DeviceCommandRouter;
use relayhub_app::transport::MemoryTransport;
use relayhub_domain::device::DeviceType;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Bus
    let transport = Arc::new(MemoryTransport::new());
    let bus = Arc::new(MessageBus::new(Arc::clone(&transport)));

    // Consumers
    let relay = log_relay::launch(&bus, TracingLogSink).await?;
    let router = DeviceCommandRouter::launch(
        Arc::clone(&bus),
        DeviceType::Tv.topic(),
        &config.devices_of(DeviceType::Tv),
        &VirtualConnectionFactory::new(),
        config.router.to_router_config(),
    )
    .await?;

    // HTTP
    let state = AppState::new(
        Arc::clone(&bus),
        config.devices.clone(),
        config.request_timeout(),
    );
    let app = relayhub_adapter_http_axum::router::build(state);

    // Remote access
    let messenger = config.messenger.enabled.then(|| {
        relayhub_adapter_messenger::launch(&config.messenger, Forwarder::new(app.clone()))
    });

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        %bind_addr,
        devices = router.device_count(),
        "relayhubd listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(messenger) = messenger
        && let Err(err) = messenger.shutdown().await
    {
        tracing::warn!(error = %err, "failed to disconnect messenger");
    }
    router.shutdown().await;
    bus.unsubscribe(relay).await;
    transport.close();
    tracing::info!("relayhubd stopped");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
