//! Auth middleware.

use std::sync::Arc;

use salvo::{Writer as _, prelude::*};

use tollgate_app::auth::API_TOKEN_HEADER;

use crate::{errors::ApiError, extensions::*, state::State};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => Arc::clone(state),
        Err(error) => {
            error.write(req, depot, res).await;
            ctrl.skip_rest();

            return;
        }
    };

    let ctx = state.request_context();
    let header = req.header::<String>(API_TOKEN_HEADER);

    match state
        .app
        .authenticator
        .authenticate_header(&ctx, header.as_deref())
        .await
    {
        Ok(requester) => {
            depot.insert_requester(requester, ctx);

            ctrl.call_next(req, depot, res).await;
        }
        Err(source) => {
            ApiError::from(source).write(req, depot, res).await;

            ctrl.skip_rest();
        }
    }
}
