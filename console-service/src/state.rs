//! Application state for the console service.

use std::sync::Arc;
use std::time::Duration;

use common::config::AppConfig;

use crate::backends::{Connector, SqlxConnector};
use crate::registry::ConnectionRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    /// Creates a state whose registry opens real database connections.
    pub fn new(config: AppConfig) -> Self {
        let connector = SqlxConnector::new(Duration::from_secs(config.connect_timeout_secs));
        Self::with_connector(config, Arc::new(connector))
    }

    /// Creates a state with a custom connector.
    pub fn with_connector(config: AppConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(connector)),
            config,
        }
    }
}
