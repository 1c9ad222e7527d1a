//! Binary entry point for the cover server.

use shelfwise_server::{api_routes, config::ServerConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shelfwise_server=info".parse().expect("static directive")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Could not set up cover providers: {}", e);
            std::process::exit(1);
        }
    };

    let app = api_routes(state.clone()).layer(tower_http::cors::CorsLayer::permissive());

    let addr = state.config.bind_addr();
    tracing::info!(providers = ?state.resolver.provider_names(), "Cover server listening on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Could not bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
