//! Create Token Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, prelude::*};

use tollgate_app::auth::NewApiToken;

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    tokens::models::{CreateTokenRequest, TokenCreatedResponse},
};

/// Create Token Handler
///
/// Issues a token for the requester. The bearer is in this response and
/// nowhere else.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<TokenCreatedResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;

    let body = req
        .parse_json::<CreateTokenRequest>()
        .await
        .map_err(|_ignored| ApiError::bad_request("expected a JSON token request body"))?;

    let issued = state
        .app
        .api_tokens
        .issue_api_token(
            &ctx,
            NewApiToken {
                owner_uuid: requester.owner_uuid,
                owner_nano_id: Some(requester.owner_nano_id.clone()),
                description: body.description,
                ttl_seconds: body.ttl_seconds,
            },
        )
        .await?;

    res.add_header(LOCATION, format!("/tokens/{}", issued.token.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(issued.into()))
}
