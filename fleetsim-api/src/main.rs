use std::net::SocketAddr;
use std::sync::Arc;

use fleetsim_api::{app, AppState};
use fleetsim_reservation::ReservationEngine;
use fleetsim_store::{Config, HttpSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fleetsim_api=debug,fleetsim_reservation=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        "Starting fleet simulator on port {}, fleet controller at {}",
        config.server.port,
        config.fleet_controller.endpoint
    );

    let sink = HttpSink::new(&config.fleet_controller)?;
    let engine = ReservationEngine::new(Arc::new(sink), config.engine_settings()?);

    let app = app(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }
    Ok(())
}
