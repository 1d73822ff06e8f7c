//! State

use std::{sync::Arc, time::Duration};

use tollgate_app::{context::AppContext, store::Context};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,
    request_timeout: Duration,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, request_timeout: Duration) -> Self {
        Self {
            app,
            request_timeout,
        }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext, request_timeout: Duration) -> Arc<Self> {
        Arc::new(Self::new(app, request_timeout))
    }

    /// Store context for one request, bounded by the request timeout.
    #[must_use]
    pub(crate) fn request_context(&self) -> Context {
        Context::with_timeout(self.request_timeout)
    }
}
