use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use fusionfest::config::Config;
use fusionfest::database;
use fusionfest::state::AppState;
use fusionfest::web;

#[tokio::main]
async fn main() {
    dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting FusionFest site");

    let config = Config::load().expect("Environment misconfigured");
    let store = database::connect(&config)
        .await
        .expect("Could not set up registration storage");

    let host = config.host.clone();
    let port = config.port;
    let fallback_port = config.fallback_port();
    let app = web::router(AppState::new(config, store));

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Could not parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let Some(next) = fallback_port else {
                error!("Could not bind {}: {}. No fallback port above {}", addr, e, port);
                std::process::exit(1);
            };
            warn!("Could not bind {}: {}. Trying {}:{}", addr, e, host, next);
            let fallback: SocketAddr = format!("{}:{}", host, next)
                .parse()
                .expect("Could not parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Could not bind fallback port")
        }
    };

    if let Ok(bound) = listener.local_addr() {
        info!("Server running on http://{}", bound);
        info!("Registration form at http://{}/register", bound);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
