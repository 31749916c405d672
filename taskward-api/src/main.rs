//! # Taskward API Server
//!
//! Multi-user task API with token authentication and per-task ownership
//! checks.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORAGE=memory cargo run -p taskward-api
//! ```

use anyhow::Context;
use taskward_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use taskward_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskward_api=debug,taskward_shared=info,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before tracing init so LOG_FORMAT / RUST_LOG from .env apply
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Taskward API Server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address();
    let admin = config.admin.clone();

    let state = match (config.storage, config.database.clone()) {
        (StorageBackend::Postgres, Some(database)) => {
            let pool = create_pool(DatabaseConfig::new(database.url, database.max_connections))
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            AppState::postgres(pool, config).context("Failed to initialize authentication")?
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("DATABASE_URL is required"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data will be lost on exit");
            AppState::in_memory(config).context("Failed to initialize authentication")?
        }
    };

    if let Some(admin) = admin {
        state
            .auth
            .ensure_admin(&admin.username, &admin.password)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let pool = state.db.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    Ok(())
}
