//! Token Status Handlers

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    tokens::models::{TokenResponse, UpdateStatusRequest},
};

use super::token_uuid_param;

/// Activate Token Handler
///
/// Activating an active token succeeds without a write.
#[handler]
pub(crate) async fn activate(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;
    let uuid = token_uuid_param(req)?;

    let token = state
        .app
        .api_tokens
        .activate_api_token(&ctx, Some(requester.owner_uuid), uuid)
        .await?;

    Ok(Json(token.into()))
}

/// Revoke Token Handler
#[handler]
pub(crate) async fn revoke(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;
    let uuid = token_uuid_param(req)?;

    let token = state
        .app
        .api_tokens
        .revoke_api_token(&ctx, Some(requester.owner_uuid), uuid)
        .await?;

    Ok(Json(token.into()))
}

/// Update Token Status Handler
///
/// Accepts `ACTIVE` or `REVOKED` in any case.
#[handler]
pub(crate) async fn update(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;
    let uuid = token_uuid_param(req)?;

    let body = req
        .parse_json::<UpdateStatusRequest>()
        .await
        .map_err(|_ignored| ApiError::bad_request("expected a JSON body with a status"))?;

    let token = state
        .app
        .api_tokens
        .set_api_token_status(&ctx, Some(requester.owner_uuid), uuid, &body.status)
        .await?;

    Ok(Json(token.into()))
}
