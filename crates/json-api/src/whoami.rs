//! Whoami Handler

use salvo::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ApiError, extensions::*};

/// The caller as identified by its token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WhoamiResponse {
    pub owner_uuid: Uuid,
    pub owner_nano_id: String,
    pub token_uuid: Uuid,
}

#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<WhoamiResponse>, ApiError> {
    let requester = depot.requester_or_401()?;

    Ok(Json(WhoamiResponse {
        owner_uuid: requester.owner_uuid.into_uuid(),
        owner_nano_id: requester.owner_nano_id.clone(),
        token_uuid: requester.token_uuid.into_uuid(),
    }))
}
