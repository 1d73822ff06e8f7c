//! Get Token Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{errors::ApiError, extensions::*, state::State, tokens::models::TokenResponse};

use super::token_uuid_param;

/// Get Token Handler
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;
    let uuid = token_uuid_param(req)?;

    let view = state
        .app
        .api_tokens
        .get_api_token(&ctx, Some(requester.owner_uuid), uuid)
        .await?;

    Ok(Json(view.into()))
}
