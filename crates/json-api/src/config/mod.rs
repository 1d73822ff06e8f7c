//! Server configuration module

use std::time::Duration;

use clap::Parser;

use crate::config::{
    auth::AuthConfig, logging::LoggingConfig, server::ServerRuntimeConfig, store::StoreConfig,
};

pub(crate) mod auth;
pub(crate) mod logging;
pub(crate) mod server;
pub(crate) mod store;

pub(crate) use logging::LogFormat;
pub(crate) use store::StoreBackend;

/// Tollgate JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "tollgate-json", about = "Tollgate JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Token store settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Authentication settings.
    #[command(flatten)]
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Deadline applied to the store calls of a single request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}
