//! Busline server - driver position sharing with a public location feed.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use busline_server::{api, config::Config, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("busline_server=debug".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting busline server...");

    let state = AppState::initialize(config.clone())
        .await
        .context("failed to load persisted state")?;
    tracing::info!(
        "{} drivers registered, {} positions on record",
        state.credentials().len(),
        state.locations().len().await
    );

    let app = api::app(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.server_port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
