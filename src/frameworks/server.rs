// Framework bootstrap for the relay server runtime.

use crate::domain::{CarCatalog, SystemClock};
use crate::frameworks::config;
use crate::frameworks::runtime::init_runtime;
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Relay, RelayBroadcast, RelayEvent, SessionRegistry, relay_task};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{broadcast, mpsc};

/// Serves the relay with the built-in car catalog.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_catalog(listener, CarCatalog::builtin()).await
}

pub async fn run_with_catalog(listener: tokio::net::TcpListener, catalog: CarCatalog) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state(catalog);
    // Start the Web Server
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime("street_racer");

    let catalog = config::car_catalog().map_err(|e| {
        tracing::error!(error = %e, "failed to load car catalog");
        std::io::Error::other(e)
    })?;
    tracing::info!(
        cars = catalog.len(),
        default_car = %catalog.default_car().id,
        "car catalog loaded"
    );

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run_with_catalog(listener, catalog).await
}

fn build_state(catalog: CarCatalog) -> Arc<AppState> {
    // events_tx/rx: every connection's events go to the single relay task.
    let (events_tx, events_rx) = mpsc::channel::<RelayEvent>(config::EVENT_CHANNEL_CAPACITY);

    // outbound_tx: relay fan-out; connections subscribe through the relay itself.
    let (outbound_tx, _) = broadcast::channel::<RelayBroadcast>(config::RELAY_BROADCAST_CAPACITY);

    let relay = Relay::new(
        SessionRegistry::new(Arc::new(catalog)),
        SystemClock,
        outbound_tx,
    );

    // Spawn the relay task. It exits once every sender (AppState included) is gone.
    tokio::spawn(relay_task(events_rx, relay));

    Arc::new(AppState { events_tx })
}
