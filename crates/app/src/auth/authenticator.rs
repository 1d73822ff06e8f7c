//! Header-based authentication for HTTP middleware.

use std::{fmt, sync::Arc};

use crate::{
    auth::{ApiTokensService, ApiTokensServiceError, Requester},
    store::Context,
};

/// Header carrying the bearer. No `Bearer` scheme prefix.
pub const API_TOKEN_HEADER: &str = "x-api-token";

#[derive(Clone)]
pub struct Authenticator {
    service: Arc<dyn ApiTokensService>,
    touch_last_used: bool,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("touch_last_used", &self.touch_last_used)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    #[must_use]
    pub fn new(service: Arc<dyn ApiTokensService>, touch_last_used: bool) -> Self {
        Self {
            service,
            touch_last_used,
        }
    }

    /// Authenticate the raw value of the `X-Api-Token` header.
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::UnableToFindRequiredHeaders`] when the header is
    /// absent or blank, otherwise whatever authentication or the touch reported.
    pub async fn authenticate_header(
        &self,
        ctx: &Context,
        header: Option<&str>,
    ) -> Result<Requester, ApiTokensServiceError> {
        let bearer = header
            .map(str::trim)
            .filter(|bearer| !bearer.is_empty())
            .ok_or(ApiTokensServiceError::UnableToFindRequiredHeaders)?;

        let requester = self.service.authenticate(ctx, bearer).await?;

        if self.touch_last_used {
            self.service
                .touch_last_used(ctx, &requester.owner_nano_id, requester.value_hash)
                .await?;
        }

        Ok(requester)
    }
}
