use std::net::SocketAddr;
use std::sync::Arc;

use shared::config::{ApiConfig, DEFAULT_API_BIND_ADDR, load_dotenv};
use shared::llm::UpstreamGateway;
use tokio::signal;
use tracing::{error, info, warn};

mod http;

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    init_tracing();

    let config = match ApiConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to read config");
            std::process::exit(1);
        }
    };

    let default_model = config.upstream.default_model.clone();
    let allowed_models = config.upstream.allowed_models.len();
    let gateway = match UpstreamGateway::new(config.upstream) {
        Ok(gateway) => gateway,
        Err(err) => {
            error!(error = %err, "failed to build upstream gateway");
            std::process::exit(1);
        }
    };

    let app = http::build_router(http::AppState {
        gateway: Arc::new(gateway),
    });

    let addr = match config.bind_addr.parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => {
            warn!(
                bind_addr = %config.bind_addr,
                "invalid API_BIND_ADDR, using {DEFAULT_API_BIND_ADDR}"
            );
            SocketAddr::from(([127, 0, 0, 1], 8080))
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };

    info!(
        default_model = %default_model,
        allowed_models,
        "api server listening on {}",
        listener.local_addr().unwrap_or(addr)
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "api_server=info,axum=info".to_string());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
