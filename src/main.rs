//! HTTP server for the Tip Pool Engine.
//!
//! Reads `config/engine.yaml` (or the directory named by `TIP_ENGINE_CONFIG`),
//! opens the configured store, seeds distribution rules, and serves the API.

use anyhow::{Context, bail};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tip_pool_engine::api::{AppState, create_router};
use tip_pool_engine::config::{ConfigLoader, EngineConfig, StoreBackend};
use tip_pool_engine::engine::TipPoolEngine;
use tip_pool_engine::notify::BroadcastNotifier;
use tip_pool_engine::store::{MemoryStore, PgStore, TipStore};

const CONFIG_DIR_ENV: &str = "TIP_ENGINE_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir = std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| "./config".to_string());
    let loader = ConfigLoader::load(&config_dir)
        .with_context(|| format!("loading configuration from {}", config_dir))?
        .with_env_overrides();
    let config = loader.config().clone();

    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown");
            serve(MemoryStore::new(), &config, &loader).await
        }
        StoreBackend::Postgres => {
            let Some(url) = config.store.database_url.as_deref() else {
                bail!("store.backend is postgres but no database_url or DATABASE_URL is set");
            };
            let store = PgStore::connect(url, config.store.max_connections).await?;
            store.migrate().await?;
            serve(store, &config, &loader).await
        }
    }
}

async fn serve<S: TipStore>(
    store: S,
    config: &EngineConfig,
    loader: &ConfigLoader,
) -> anyhow::Result<()> {
    let notifier = BroadcastNotifier::new(config.notifications.channel_capacity);
    let engine = TipPoolEngine::new(store, notifier, config.engine);

    seed_rules(&engine, loader).await?;

    let app = create_router(AppState::new(engine)).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "Tip pool server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Creates configured rules whose name is not already taken by an active rule.
async fn seed_rules<S: TipStore>(
    engine: &TipPoolEngine<S, BroadcastNotifier>,
    loader: &ConfigLoader,
) -> anyhow::Result<()> {
    let existing = engine.get_distribution_rules().await?;
    for rule in loader.seed_rules() {
        if existing.iter().any(|r| r.name == rule.name) {
            continue;
        }
        let created = engine.create_distribution_rule(rule.clone()).await?;
        info!(rule_id = created.id, rule_name = %created.name, "Seeded distribution rule");
    }
    Ok(())
}
