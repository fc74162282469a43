mod aggregation;
mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod handlers;
mod middleware;
mod models;
mod openapi;
mod startup;

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use aggregation::Aggregator;
pub use config::{AppConfig, StoreBackend};
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;

use db::EntryStore;
use models::User;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
    pub aggregator: Aggregator,
    pub user_cache: Cache<i32, User>,
    pub config: AppConfig,
    pub metrics: Arc<MetricsState>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>, config: AppConfig, metrics: MetricsState) -> Self {
        let user_cache = Cache::builder()
            .time_to_live(Duration::from_secs(300))
            .max_capacity(10_000)
            .build();

        Self {
            aggregator: Aggregator::new(store.clone(), config.timezone),
            store,
            user_cache,
            config,
            metrics: Arc::new(metrics),
        }
    }
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn EntryStore>, Box<dyn std::error::Error>> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, entries are lost on restart");
            Ok(Arc::new(db::MemoryStore::new()))
        }
        StoreBackend::Postgres(url) => {
            let pool = db::create_pool(url).await.map_err(|e| {
                tracing::error!("Failed to create database pool: {}", e);
                e
            })?;
            tracing::info!("Database pool created successfully");

            db::run_migrations(&pool).await.map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
            tracing::info!("Migrations applied");

            Ok(Arc::new(db::PgStore::new(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,guinea_tracker=debug,tower_http=debug".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;
    tracing::info!(timezone = %config.timezone, title = %config.title, "Configuration loaded");

    let store = open_store(&config.store).await?;

    let metrics = handlers::setup_metrics_recorder()?;
    tracing::info!("Metrics recorder initialized");

    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState::new(store, config, metrics));

    let app = startup::build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
