//! Order Service Binary
//!
//! Starts the delivery-order HTTP service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-service
//! ```
//!
//! Configuration comes from environment variables (a `.env` file is
//! honored); see [`order_service::config`] for the full list.

use std::net::SocketAddr;
use std::sync::Arc;

use order_service::config::Settings;
use order_service::distance::GoogleMapsResolver;
use order_service::repository::PgOrderStore;
use order_service::server::{AppState, create_router};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    tracing::info!("Starting order service");

    let settings = Settings::from_env()?;
    tracing::info!(
        bind_address = %settings.server.bind_address,
        http_port = settings.server.http_port,
        db_max_connections = settings.database.max_connections,
        resolver_timeout_secs = settings.resolver.timeout.as_secs(),
        "Configuration loaded"
    );

    let store = Arc::new(PgOrderStore::connect(&settings.database).await?);
    let resolver = Arc::new(GoogleMapsResolver::new(&settings.resolver)?);
    let app = create_router(AppState::new(store, resolver));

    let addr: SocketAddr = format!(
        "{}:{}",
        settings.server.bind_address, settings.server.http_port
    )
    .parse()?;

    tracing::info!(%addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET   /healthcheck");
    tracing::info!("  POST  /orders");
    tracing::info!("  PATCH /orders/{{id}}");
    tracing::info!("  GET   /orders?page={{p}}&limit={{n}}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Order service stopped");
    Ok(())
}

/// Load a `.env` file if one is present; absence is not an error.
fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is a compile-time constant
/// guaranteed to parse.
#[allow(clippy::expect_used)]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "order_service=info"
                    .parse()
                    .expect("static directive 'order_service=info' is valid"),
            ),
        )
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; a process that cannot
/// respond to termination signals should fail fast at startup.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
