//! Token Handlers

use salvo::prelude::Request;

use tollgate_app::auth::ApiTokenUuid;

use crate::errors::ApiError;

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod status;

const TOKEN_PARAM: &str = "token";

fn token_uuid_param(req: &Request) -> Result<ApiTokenUuid, ApiError> {
    req.param::<String>(TOKEN_PARAM)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ApiError::bad_request("token id must be a UUID"))
}
