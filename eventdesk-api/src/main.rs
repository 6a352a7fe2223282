//! # EventDesk API Server
//!
//! Loads configuration, connects to PostgreSQL, applies migrations and
//! serves the HTTP API until SIGINT or SIGTERM.
//!
//! Google Workspace integration is enabled when `GOOGLE_SERVICE_ACCOUNT_FILE`
//! is set; without it, attaching generated documents fails with a 500.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p eventdesk-api
//! LOG_FORMAT=json RUST_LOG=eventdesk_api=info cargo run -p eventdesk-api
//! ```

use anyhow::Context;
use eventdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use eventdesk_docs::{
    timeout::resolve_timeout, DisabledDocumentService, DocumentService, GoogleWorkspaceClient,
    ServiceAccountKey,
};
use eventdesk_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str =
    "eventdesk_api=debug,eventdesk_shared=info,eventdesk_docs=info,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn document_service(config: &Config) -> anyhow::Result<Arc<dyn DocumentService>> {
    let Some(path) = config.docs.service_account_file.as_ref() else {
        tracing::warn!("GOOGLE_SERVICE_ACCOUNT_FILE not set, document creation disabled");
        return Ok(Arc::new(DisabledDocumentService));
    };

    let key = ServiceAccountKey::from_file(path)
        .await
        .with_context(|| format!("loading service account from {}", path.display()))?;
    let timeout = resolve_timeout(config.docs.timeout_seconds);
    let client = GoogleWorkspaceClient::new(key, timeout)?;

    tracing::info!(
        client_email = client.client_email(),
        timeout_secs = timeout.as_secs(),
        "Google Workspace document service enabled"
    );
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("EventDesk API v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("connecting to the database")?;

    run_migrations(&pool).await.context("running migrations")?;

    let documents = document_service(&config).await?;
    let bind_address = config.bind_address();

    let state = AppState::new(pool.clone(), config, documents);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {}", bind_address))?;
    tracing::info!("Listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
