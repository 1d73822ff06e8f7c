//! Delete Token Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{errors::ApiError, extensions::*, state::State};

use super::token_uuid_param;

/// Delete Token Handler
///
/// Succeeds whether or not the requester owned a token with this id.
#[handler]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> Result<StatusCode, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;
    let uuid = token_uuid_param(req)?;

    state
        .app
        .api_tokens
        .delete_api_token(&ctx, requester.owner_uuid, uuid)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
