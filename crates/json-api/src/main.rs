//! Tollgate JSON API Server

use std::process;

use salvo::prelude::*;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tollgate_app::context::{AppContext, AppInitError};

use crate::{
    config::{ServerConfig, StoreBackend},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod config;
mod errors;
mod extensions;
mod healthcheck;
mod observability;
mod router;
mod shutdown;
mod state;
mod sweeper;
#[cfg(test)]
mod test_helpers;
mod tokens;
mod whoami;

#[derive(Debug, Error)]
enum StartupError {
    #[error("DATABASE_URL is required when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("failed to initialize app context: {0}")]
    App(#[from] AppInitError),
}

/// Build the app context for the configured store backend.
async fn app_context(config: &ServerConfig) -> Result<AppContext, StartupError> {
    let touch_last_used = config.auth.touch_last_used;

    match config.store.store {
        StoreBackend::Memory => {
            info!("using in-memory token store");

            Ok(AppContext::in_memory(touch_last_used))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .store
                .database_url
                .as_deref()
                .ok_or(StartupError::MissingDatabaseUrl)?;

            Ok(AppContext::from_database_url(database_url, touch_last_used).await?)
        }
    }
}

/// Tollgate JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init_logging(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Logging error: {init_error}");
        }

        process::exit(1);
    }

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let app = match app_context(&config).await {
        Ok(app) => app,
        Err(startup_error) => {
            error!("{startup_error}");

            process::exit(1);
        }
    };

    let state = State::from_app_context(app, config.request_timeout());

    let shutdown_token = CancellationToken::new();

    if let Some(interval) = config.store.sweep_interval() {
        info!(interval_seconds = interval.as_secs(), "starting expired token sweeper");

        drop(sweeper::spawn(state.clone(), interval, shutdown_token.clone()));
    }

    let server = Server::new(listener);

    let handle = server.handle();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, shutdown_token).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(router::app_router(state)).await;
}
