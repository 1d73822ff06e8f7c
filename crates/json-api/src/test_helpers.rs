//! Test helpers.

use std::{sync::Arc, time::Duration};

use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use tollgate_app::{
    auth::{ApiTokenUuid, MockApiTokensService, OwnerUuid, Requester, ValueHash},
    context::AppContext,
    store::Context,
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_OWNER_UUID: OwnerUuid =
    OwnerUuid::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0042));

pub(crate) const TEST_NANO_ID: &str = "test-nano";

pub(crate) fn test_requester() -> Requester {
    Requester {
        owner_uuid: TEST_OWNER_UUID,
        owner_nano_id: TEST_NANO_ID.to_owned(),
        token_uuid: ApiTokenUuid::from_uuid(Uuid::from_u128(
            0x0190_0000_0000_7000_8000_0000_0000_0001,
        )),
        value_hash: ValueHash::digest(b"test-secret"),
    }
}

#[salvo::handler]
pub(crate) async fn inject_requester(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_requester(test_requester(), Context::background());
    ctrl.call_next(req, depot, res).await;
}

pub(crate) fn state_with_tokens(tokens: MockApiTokensService, touch_last_used: bool) -> Arc<State> {
    State::from_app_context(
        AppContext::from_service(Arc::new(tokens), touch_last_used),
        Duration::from_secs(5),
    )
}

pub(crate) fn tokens_service(tokens: MockApiTokensService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_tokens(tokens, false)))
            .hoop(inject_requester)
            .push(route),
    )
}
