//! Test context for service-level tests.
//!
//! The service runs against a [`MemoryStore`] and a [`ManualClock`], so TTL
//! scenarios advance time instead of sleeping.

use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    auth::{
        ApiTokensService, ApiTokensServiceError, IssuedApiToken, NewApiToken, OwnerUuid,
        StoreApiTokensService,
    },
    clock::ManualClock,
    store::{Context, MemoryStore},
};

/// 2026-01-01T00:00:00Z
const START_SECONDS: i64 = 1_767_225_600;

pub(crate) struct TestContext {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub service: StoreApiTokensService,
    pub ctx: Context,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let store = MemoryStore::new();
        let start = Timestamp::from_second(START_SECONDS).unwrap_or(Timestamp::UNIX_EPOCH);
        let clock = ManualClock::new(start);

        Self {
            service: StoreApiTokensService::with_clock(
                Arc::new(store.clone()),
                Arc::new(clock.clone()),
            ),
            store,
            clock,
            ctx: Context::background(),
        }
    }

    /// Issue a token with a generated description.
    pub(crate) async fn issue(
        &self,
        owner: OwnerUuid,
        nano_id: Option<&str>,
        ttl_seconds: Option<u64>,
    ) -> Result<IssuedApiToken, ApiTokensServiceError> {
        self.service
            .issue_api_token(
                &self.ctx,
                NewApiToken {
                    owner_uuid: owner,
                    owner_nano_id: nano_id.map(str::to_owned),
                    description: None,
                    ttl_seconds,
                },
            )
            .await
    }
}
