//! API module for the TBR lookup service
//!
//! Provides the REST endpoints used by the TBR client apps.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::resolver::BookResolver;
use crate::tropes::TropeDictionary;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{create_router, AppState};

/// API Server for handling REST requests
pub struct ApiServer {
    state: AppState,
    config: Arc<Config>,
}

impl ApiServer {
    /// Create a new API server with resolvers built from the configuration
    pub fn new(config: Arc<Config>, tropes: TropeDictionary) -> Result<Self> {
        let resolver = BookResolver::from_strategy(&config, config.sources.strategy, tropes.clone())?;
        let metadata_resolver = BookResolver::metadata_only(&config, tropes)?;

        Ok(Self::with_state(
            AppState {
                resolver: Arc::new(resolver),
                metadata_resolver: Arc::new(metadata_resolver),
            },
            config,
        ))
    }

    pub fn with_state(state: AppState, config: Arc<Config>) -> Self {
        Self { state, config }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.config.server.port);

        server::start_http_server(
            self.state,
            &self.config.server.host,
            self.config.server.port,
            self.config.server.cors_allow_any,
        )
        .await
    }
}
