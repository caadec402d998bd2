use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use campus_events::config::{self, Environment};
use campus_events::database::{DatabaseManager, MemoryStore, PgStore, Store};
use campus_events::services::LogNotifier;
use campus_events::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("campus_events=debug,tower_http=info")),
        )
        .init();

    let config = config::config();
    config.check()?;
    tracing::info!("Starting campus events API in {:?} mode", config.environment);

    let pool = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data will not persist");
            None
        }
    };
    let store: Arc<dyn Store> = match &pool {
        Some(pool) => Arc::new(PgStore::new(pool.clone())),
        None => Arc::new(MemoryStore::new()),
    };

    if config.environment != Environment::Development {
        tracing::warn!("No mail transport configured; reset codes are not delivered");
    }
    let notifier = Arc::new(LogNotifier::for_environment(config.environment));
    let state = AppState::new(store, notifier);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        DatabaseManager::close(pool).await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
