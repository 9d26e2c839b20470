//! Shared server state.

use std::sync::Arc;

use platematch_core::Coordinator;

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;

/// Shared application state, cloned into every connection handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let verifier = Arc::new(TokenVerifier::new(&config.jwt_secret));
        Self {
            coordinator: Arc::new(Coordinator::new()),
            verifier,
            config: Arc::new(config),
        }
    }
}
