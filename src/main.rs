use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smart_home_dashboard::{
    api::{self, AppState},
    client::ApiClient,
    config::Config,
    control::FanController,
    query::{self, QueryCache, QueryClient},
    session::Session,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Env vars may be set externally; a missing .env is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    info!(
        api_base_url = %config.api_base_url,
        authenticated = config.access_token.is_some(),
        "Configuration loaded"
    );

    let session = Session::new(config.access_token.clone());
    let client = ApiClient::new(&config.api_base_url, session);
    let queries = QueryClient::new(client.clone(), QueryCache::new());

    // Pollers run until their handles are dropped at the end of `main`.
    let pollers: Vec<_> = query::dashboard_queries(&config.intervals)
        .into_iter()
        .map(|(key, every)| queries.watch(key, every))
        .collect();
    info!(count = pollers.len(), "Query pollers started");

    let state = AppState::new(queries, FanController::new(client));

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(pollers);
    info!("Pollers stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
