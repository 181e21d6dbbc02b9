use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use pawmart_api::{app, worker, AppState, AuthConfig};
use pawmart_catalog::Catalog;
use pawmart_order::{CheckoutProcessor, MockPaymentAdapter};
use pawmart_store::{load_snapshot, Config, JsonFileRepository, SnapshotRepository, Storefront, StorefrontSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawmart_api=debug,pawmart_store=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting PawMart API on port {}", config.server.port);

    let storefront = Storefront::new(Catalog::mock(), StorefrontSettings::from(&config));
    let checkout = CheckoutProcessor::new(Arc::new(MockPaymentAdapter::new(Duration::from_millis(
        config.business_rules.checkout_processing_ms,
    ))));
    let snapshots: Option<Arc<dyn SnapshotRepository>> = config
        .storage
        .snapshot_path
        .clone()
        .map(|path| Arc::new(JsonFileRepository::new(path)) as Arc<dyn SnapshotRepository>);

    let app_state = AppState::new(
        storefront,
        checkout,
        snapshots,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    if let Some(repository) = &app_state.snapshots {
        let restored = load_snapshot(&app_state.store, repository.as_ref())
            .await
            .context("Failed to load snapshot")?;
        tracing::info!("Snapshot restored: {}", restored);
    }

    if config.fulfillment.auto_advance_seconds > 0 {
        let period = Duration::from_secs(config.fulfillment.auto_advance_seconds);
        tokio::spawn(worker::start_fulfillment_worker(app_state.clone(), period));
    }

    if config.sessions.sweep_seconds > 0 {
        let period = Duration::from_secs(config.sessions.sweep_seconds);
        tokio::spawn(worker::start_session_sweeper(app_state.clone(), period));
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
