//! Cover server for the reading-list front end.
//!
//! The browser asks this server for covers instead of calling the book
//! providers itself, so every open tab shares one cache and one in-flight
//! lookup per book.

pub mod api;
pub mod config;

use axum::Router;

use shelfwise_core::cover::CoverResolver;
use shelfwise_core::error::LookupError;

use crate::config::ServerConfig;

/// Shared application state (resolver and config).
#[derive(Clone)]
pub struct AppState {
    pub resolver: CoverResolver,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, LookupError> {
        let resolver = CoverResolver::from_config(&config.covers)?;
        Ok(Self { resolver, config })
    }

    /// Use an already-built resolver (custom providers, tests).
    pub fn with_resolver(config: ServerConfig, resolver: CoverResolver) -> Self {
        Self { resolver, config }
    }
}

/// Build API routes (under /api) with state.
pub fn api_routes(state: AppState) -> Router {
    api::routes(state)
}
