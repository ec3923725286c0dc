use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rota_api::{app, state::availability_settings, worker::start_session_sweeper, AppState};
use rota_core::{AttractionDataSource, BookingCommitter, MockPaymentGateway};
use rota_store::{Config, DbClient, InMemoryStore, PgAttractionSource, PgBookingCommitter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rota_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Rota API on port {}", config.server.port);

    let (source, committer): (Arc<dyn AttractionDataSource>, Arc<dyn BookingCommitter>) =
        match &config.database.url {
            Some(url) => {
                let db = DbClient::new(url, config.database.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await.context("Failed to run migrations")?;
                let source: Arc<dyn AttractionDataSource> =
                    Arc::new(PgAttractionSource::new(db.pool.clone()));
                let committer: Arc<dyn BookingCommitter> = Arc::new(PgBookingCommitter::new(
                    db.pool.clone(),
                    Arc::new(MockPaymentGateway),
                ));
                (source, committer)
            }
            None => {
                let store = Arc::new(InMemoryStore::new());
                let attraction_id = store.seed_demo(chrono::Utc::now().date_naive()).await;
                tracing::warn!(%attraction_id, "No database configured, serving in-memory demo data");
                let source: Arc<dyn AttractionDataSource> = store.clone();
                let committer: Arc<dyn BookingCommitter> = store;
                (source, committer)
            }
        };

    let state = AppState::new(source, committer, availability_settings(&config.availability));

    let cancel = CancellationToken::new();
    let sweeper = start_session_sweeper(
        state.sessions.clone(),
        Duration::from_secs(config.sessions.ttl_seconds),
        Duration::from_secs(config.sessions.sweep_interval_seconds),
        cancel.clone(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let shutdown = cancel.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    sweeper.await?;
    Ok(())
}
