//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;

use tollgate_app::{
    auth::{ApiTokensServiceError, Requester},
    store::Context,
};

use crate::errors::ApiError;

/// Helpers for reading per-request values out of the depot.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_requester(&mut self, requester: Requester, ctx: Context);

    /// The authenticated caller. Absent only when a route skipped the auth middleware.
    fn requester_or_401(&self) -> Result<&Requester, ApiError>;

    fn request_context(&self) -> Result<Context, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>().map_err(|_ignored| ApiError::internal())
    }

    fn insert_requester(&mut self, requester: Requester, ctx: Context) {
        self.inject(requester);
        self.inject(ctx);
    }

    fn requester_or_401(&self) -> Result<&Requester, ApiError> {
        self.obtain::<Requester>()
            .map_err(|_ignored| ApiTokensServiceError::UnableToFindRequiredHeaders.into())
    }

    fn request_context(&self) -> Result<Context, ApiError> {
        self.obtain_or_500::<Context>().cloned()
    }
}
