//! App Router

use std::sync::Arc;

use salvo::{Router, affix_state::inject, catch_panic::CatchPanic, trailing_slash::remove_slash};

use crate::{auth, healthcheck, observability, state::State, tokens, whoami};

/// Routes behind the `X-Api-Token` middleware.
fn api_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(Router::with_path("whoami").get(whoami::handler))
        .push(
            Router::with_path("tokens")
                .get(tokens::index::handler)
                .post(tokens::create::handler)
                .push(
                    Router::with_path("{token}")
                        .get(tokens::get::handler)
                        .delete(tokens::delete::handler)
                        .push(Router::with_path("activate").post(tokens::status::activate))
                        .push(Router::with_path("revoke").post(tokens::status::revoke))
                        .push(Router::with_path("status").patch(tokens::status::update)),
                ),
        )
}

/// The complete server router.
pub(crate) fn app_router(state: Arc<State>) -> Router {
    Router::new()
        .hoop(CatchPanic::new())
        .hoop(observability::request_logging)
        .hoop(remove_slash())
        .hoop(inject(state))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(api_router())
}
