//! App Context

use std::sync::Arc;

use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    auth::{ApiTokensService, Authenticator, StoreApiTokensService},
    database,
    store::{MemoryStore, PgStore, Store},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to run database migrations")]
    Migrate(#[source] MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub api_tokens: Arc<dyn ApiTokensService>,
    pub authenticator: Authenticator,
}

impl AppContext {
    /// Build application context over an existing store.
    #[must_use]
    pub fn from_store(store: Arc<dyn Store>, touch_last_used: bool) -> Self {
        Self::from_service(
            Arc::new(StoreApiTokensService::new(store)),
            touch_last_used,
        )
    }

    /// Build application context around any token service implementation.
    #[must_use]
    pub fn from_service(api_tokens: Arc<dyn ApiTokensService>, touch_last_used: bool) -> Self {
        Self {
            authenticator: Authenticator::new(api_tokens.clone(), touch_last_used),
            api_tokens,
        }
    }

    /// Build application context backed by a process-local store.
    #[must_use]
    pub fn in_memory(touch_last_used: bool) -> Self {
        Self::from_store(Arc::new(MemoryStore::new()), touch_last_used)
    }

    /// Build application context from a database URL, applying migrations first.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or migrating fails.
    pub async fn from_database_url(
        url: &str,
        touch_last_used: bool,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        Ok(Self::from_store(Arc::new(PgStore::new(pool)), touch_last_used))
    }
}
