//! Token Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use tollgate_app::auth::{ApiTokenOrder, ApiTokenQuery, Pagination};

use crate::{errors::ApiError, extensions::*, state::State, tokens::models::TokenPageResponse};

fn parse_query(req: &Request) -> Result<ApiTokenQuery, ApiError> {
    Ok(ApiTokenQuery {
        description: req.query::<String>("description"),
        status: req.query::<String>("status"),
        only_ephemeral: req
            .query::<String>("only_ephemeral")
            .into_flag("only_ephemeral")?,
        only_permanent: req
            .query::<String>("only_permanent")
            .into_flag("only_permanent")?,
        created_from: req
            .query::<String>("created_from")
            .into_timestamp("created_from")?,
        created_to: req
            .query::<String>("created_to")
            .into_timestamp("created_to")?,
        order: req
            .query::<String>("order")
            .as_deref()
            .map(ApiTokenOrder::from)
            .unwrap_or_default(),
        pagination: Pagination::new(req.query::<u64>("page"), req.query::<u64>("per_page")),
        strict: req.query::<String>("strict").into_flag("strict")?,
        ..ApiTokenQuery::default()
    })
}

/// Token Index Handler
///
/// Lists the requester's tokens, newest first unless `order` says otherwise.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<TokenPageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let requester = depot.requester_or_401()?;
    let ctx = depot.request_context()?;

    let query = ApiTokenQuery {
        owner_uuid: Some(requester.owner_uuid),
        ..parse_query(req)?
    };

    let page = state
        .app
        .api_tokens
        .list_api_tokens_for_owner(&ctx, &requester.owner_nano_id, query)
        .await?;

    Ok(Json(page.into()))
}
