//! API tokens service.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::{
    auth::{
        ApiToken, ApiTokenPage, ApiTokenPatch, ApiTokenQuery, ApiTokenUuid, ApiTokenView,
        ApiTokensServiceError, IssuedApiToken, NewApiToken, OwnerUuid, Requester,
        TokenStatus, ValueHash, description_or_codename, format_bearer,
        generate_api_token_secret, parse_bearer,
        reaper::{self, Reaped},
        repository::{ApiTokensRepository, NewApiTokenRecord},
    },
    clock::{Clock, SystemClock},
    store::{Context, Store},
};

#[derive(Debug, Clone)]
pub struct StoreApiTokensService {
    repository: ApiTokensRepository,
    clock: Arc<dyn Clock>,
}

impl StoreApiTokensService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository: ApiTokensRepository::new(store),
            clock,
        }
    }

    /// Load a token, hiding it when expired or owned by someone outside `scope`.
    async fn visible_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiToken, ApiTokensServiceError> {
        let token = self.repository.get_by_id(ctx, uuid).await?;

        if scope.is_some_and(|owner| owner != token.owner_uuid) {
            return Err(ApiTokensServiceError::ResourceNotFound);
        }

        let Reaped { kept, .. } =
            reaper::reap(&self.repository, ctx, vec![token], self.clock.now()).await;

        kept.into_iter()
            .next()
            .ok_or(ApiTokensServiceError::ResourceNotFound)
    }

    /// Live tokens presented under `nano_id`, most recently used first.
    async fn candidates(
        &self,
        ctx: &Context,
        nano_id: &str,
    ) -> Result<Vec<ApiToken>, ApiTokensServiceError> {
        let tokens = self.repository.list_by_nano_id(ctx, nano_id).await?;

        Ok(reaper::reap(&self.repository, ctx, tokens, self.clock.now())
            .await
            .kept)
    }

    async fn transition(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
        target: TokenStatus,
    ) -> Result<ApiToken, ApiTokensServiceError> {
        let mut token = self.visible_token(ctx, scope, uuid).await?;

        if token.status == target {
            return Ok(token);
        }

        let now = self.clock.now();

        self.repository
            .update(
                ctx,
                uuid,
                ApiTokenPatch {
                    status: Some(target),
                    last_used_at: None,
                },
                now,
            )
            .await?;

        info!(token_uuid = %uuid, status = %target, "api token status changed");

        token.status = target;
        token.updated_at = now;

        Ok(token)
    }

    fn enrich(token: ApiToken, now: Timestamp) -> ApiTokenView {
        ApiTokenView {
            created_ago: format!("{} ago", humanize(now.duration_since(token.created_at))),
            last_used_ago: token
                .last_used_at
                .map(|last_used_at| format!("{} ago", humanize(now.duration_since(last_used_at)))),
            expires_in: token
                .lifetime
                .expires_at()
                .map(|expires_at| format!("in {}", humanize(expires_at.duration_since(now)))),
            token,
        }
    }
}

fn humanize(duration: SignedDuration) -> String {
    let duration: Duration = duration.unsigned_abs();

    if duration.as_secs() == 0 {
        return "0s".to_owned();
    }

    duration.human(Truncate::Second).to_string()
}

#[automock]
#[async_trait]
pub trait ApiTokensService: Send + Sync {
    /// Issue a token for an owner. The bearer is only ever returned here.
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::RequiredUserIdMissing`] for a nil owner and
    /// [`ApiTokensServiceError::ErrorCreatingShortLivedAccessToken`] when the
    /// expiry cannot be represented.
    async fn issue_api_token(
        &self,
        ctx: &Context,
        new: NewApiToken,
    ) -> Result<IssuedApiToken, ApiTokensServiceError>;

    /// Validate a presented bearer.
    ///
    /// Does not touch `last_used_at`; see [`ApiTokensService::touch_last_used`].
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::InvalidApiFormat`] for a malformed bearer and
    /// [`ApiTokensServiceError::UnableToValidateUserApiToken`] for every other
    /// rejection.
    async fn authenticate(
        &self,
        ctx: &Context,
        bearer: &str,
    ) -> Result<Requester, ApiTokensServiceError>;

    /// Stamp `last_used_at` on the token with `value_hash` under `nano_id`.
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::NoMatchingUserApiToken`] when no live token matches.
    async fn touch_last_used(
        &self,
        ctx: &Context,
        nano_id: &str,
        value_hash: ValueHash,
    ) -> Result<(), ApiTokensServiceError>;

    /// Fetch one token. `scope` limits the lookup to one owner's tokens.
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::ResourceNotFound`] when missing, expired or out of scope.
    async fn get_api_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiTokenView, ApiTokensServiceError>;

    /// # Errors
    ///
    /// [`ApiTokensServiceError::ResourceNotFound`] when missing, expired or out of scope.
    async fn activate_api_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiToken, ApiTokensServiceError>;

    /// # Errors
    ///
    /// [`ApiTokensServiceError::ResourceNotFound`] when missing, expired or out of scope.
    async fn revoke_api_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiToken, ApiTokensServiceError>;

    /// Set a status from its wire name.
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::TokenStatusInvalid`] for anything but
    /// `ACTIVE`/`REVOKED`, plus the errors of the transition itself.
    async fn set_api_token_status(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
        status: &str,
    ) -> Result<ApiToken, ApiTokensServiceError>;

    /// Delete a token belonging to `owner`. Other owners' tokens are left alone.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn delete_api_token(
        &self,
        ctx: &Context,
        owner: OwnerUuid,
        uuid: ApiTokenUuid,
    ) -> Result<(), ApiTokensServiceError>;

    /// Cascade used when an owner is removed.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn delete_all_api_tokens_by_owner(
        &self,
        ctx: &Context,
        owner: OwnerUuid,
    ) -> Result<u64, ApiTokensServiceError>;

    /// One page of tokens. Expired tokens on the page are reaped and excluded
    /// from `total`.
    ///
    /// # Errors
    ///
    /// [`ApiTokensServiceError::InvalidQuery`] for contradictory filters and
    /// [`ApiTokensServiceError::PageOutOfRange`] past the last page in strict mode.
    async fn list_api_tokens(
        &self,
        ctx: &Context,
        query: ApiTokenQuery,
    ) -> Result<ApiTokenPage, ApiTokensServiceError>;

    /// [`ApiTokensService::list_api_tokens`] limited to one owner's nano-id.
    ///
    /// # Errors
    ///
    /// As [`ApiTokensService::list_api_tokens`].
    async fn list_api_tokens_for_owner(
        &self,
        ctx: &Context,
        owner_nano_id: &str,
        query: ApiTokenQuery,
    ) -> Result<ApiTokenPage, ApiTokensServiceError>;

    /// Delete every expired ephemeral token in one pass.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn sweep_expired_api_tokens(&self, ctx: &Context) -> Result<u64, ApiTokensServiceError>;
}

#[async_trait]
impl ApiTokensService for StoreApiTokensService {
    async fn issue_api_token(
        &self,
        ctx: &Context,
        new: NewApiToken,
    ) -> Result<IssuedApiToken, ApiTokensServiceError> {
        if new.owner_uuid.is_nil() {
            return Err(ApiTokensServiceError::RequiredUserIdMissing);
        }

        let owner_nano_id = new.owner_nano_id.filter(|nano_id| !nano_id.is_empty());

        if owner_nano_id.is_none() {
            warn!(
                owner_uuid = %new.owner_uuid,
                "issuing api token without a nano id; it cannot be presented as a header"
            );
        }

        let now = self.clock.now();

        let ttl_expires_at = match new.ttl_seconds.filter(|seconds| *seconds > 0) {
            None => None,
            Some(seconds) => {
                let seconds = i64::try_from(seconds)
                    .map_err(|_ignored| ApiTokensServiceError::ErrorCreatingShortLivedAccessToken)?;

                Some(
                    now.checked_add(SignedDuration::from_secs(seconds))
                        .map_err(|_ignored| {
                            ApiTokensServiceError::ErrorCreatingShortLivedAccessToken
                        })?,
                )
            }
        };

        let secret = generate_api_token_secret();

        let token = self
            .repository
            .create(
                ctx,
                NewApiTokenRecord {
                    value_hash: secret.value_hash(),
                    description: description_or_codename(new.description.as_deref()),
                    owner_uuid: new.owner_uuid,
                    owner_nano_id,
                    ttl_expires_at,
                },
                now,
            )
            .await?;

        info!(
            token_uuid = %token.uuid,
            owner_uuid = %token.owner_uuid,
            ephemeral = !token.lifetime.is_permanent(),
            "issued api token"
        );

        Ok(IssuedApiToken {
            bearer: format_bearer(token.owner_nano_id.as_deref(), &secret),
            secret,
            token,
        })
    }

    async fn authenticate(
        &self,
        ctx: &Context,
        bearer: &str,
    ) -> Result<Requester, ApiTokensServiceError> {
        let parsed = parse_bearer(bearer)?;

        let token = self
            .candidates(ctx, &parsed.nano_id)
            .await?
            .into_iter()
            .find(|token| bool::from(token.value_hash.ct_eq(&parsed.value_hash)))
            .ok_or(ApiTokensServiceError::UnableToValidateUserApiToken)?;

        if token.status != TokenStatus::Active {
            return Err(ApiTokensServiceError::UnableToValidateUserApiToken);
        }

        Ok(Requester {
            owner_uuid: token.owner_uuid,
            owner_nano_id: parsed.nano_id,
            token_uuid: token.uuid,
            value_hash: parsed.value_hash,
        })
    }

    async fn touch_last_used(
        &self,
        ctx: &Context,
        nano_id: &str,
        value_hash: ValueHash,
    ) -> Result<(), ApiTokensServiceError> {
        let token = self
            .candidates(ctx, nano_id)
            .await?
            .into_iter()
            .find(|token| bool::from(token.value_hash.ct_eq(&value_hash)))
            .ok_or(ApiTokensServiceError::NoMatchingUserApiToken)?;

        let now = self.clock.now();

        self.repository
            .update(
                ctx,
                token.uuid,
                ApiTokenPatch {
                    status: None,
                    last_used_at: Some(now),
                },
                now,
            )
            .await?;

        Ok(())
    }

    async fn get_api_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiTokenView, ApiTokensServiceError> {
        let token = self.visible_token(ctx, scope, uuid).await?;

        Ok(Self::enrich(token, self.clock.now()))
    }

    async fn activate_api_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiToken, ApiTokensServiceError> {
        self.transition(ctx, scope, uuid, TokenStatus::Active).await
    }

    async fn revoke_api_token(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
    ) -> Result<ApiToken, ApiTokensServiceError> {
        self.transition(ctx, scope, uuid, TokenStatus::Revoked).await
    }

    async fn set_api_token_status(
        &self,
        ctx: &Context,
        scope: Option<OwnerUuid>,
        uuid: ApiTokenUuid,
        status: &str,
    ) -> Result<ApiToken, ApiTokensServiceError> {
        let target: TokenStatus = status.parse()?;

        self.transition(ctx, scope, uuid, target).await
    }

    async fn delete_api_token(
        &self,
        ctx: &Context,
        owner: OwnerUuid,
        uuid: ApiTokenUuid,
    ) -> Result<(), ApiTokensServiceError> {
        self.repository.delete_owned(ctx, owner, uuid).await?;

        info!(token_uuid = %uuid, owner_uuid = %owner, "deleted api token");

        Ok(())
    }

    async fn delete_all_api_tokens_by_owner(
        &self,
        ctx: &Context,
        owner: OwnerUuid,
    ) -> Result<u64, ApiTokensServiceError> {
        let deleted = self.repository.delete_all_by_owner(ctx, owner).await?;

        info!(owner_uuid = %owner, deleted, "deleted api tokens for owner");

        Ok(deleted)
    }

    async fn list_api_tokens(
        &self,
        ctx: &Context,
        query: ApiTokenQuery,
    ) -> Result<ApiTokenPage, ApiTokensServiceError> {
        query.validate()?;

        let total = self.repository.count(ctx, &query).await?;
        let tokens = self.repository.list(ctx, &query).await?;

        let now = self.clock.now();
        let Reaped { kept, omitted } = reaper::reap(&self.repository, ctx, tokens, now).await;

        let total = total.saturating_sub(omitted);
        let pagination = query.pagination;
        let total_pages = pagination.total_pages(total);

        if query.strict && pagination.page() > 1 && pagination.page() > total_pages {
            return Err(ApiTokensServiceError::PageOutOfRange);
        }

        Ok(ApiTokenPage {
            items: kept
                .into_iter()
                .map(|token| Self::enrich(token, now))
                .collect(),
            total,
            total_pages,
            page: pagination.page(),
            per_page: pagination.per_page(),
        })
    }

    async fn list_api_tokens_for_owner(
        &self,
        ctx: &Context,
        owner_nano_id: &str,
        query: ApiTokenQuery,
    ) -> Result<ApiTokenPage, ApiTokensServiceError> {
        self.list_api_tokens(
            ctx,
            ApiTokenQuery {
                owner_nano_id: Some(owner_nano_id.to_owned()),
                ..query
            },
        )
        .await
    }

    async fn sweep_expired_api_tokens(&self, ctx: &Context) -> Result<u64, ApiTokensServiceError> {
        let now = self.clock.now();
        let mut deleted = 0;

        let candidates = self.repository.list_expiry_candidates(ctx, now).await?;

        for token in candidates {
            if !reaper::is_expired(&token, now) {
                continue;
            }

            self.repository.delete(ctx, token.uuid).await?;
            deleted += 1;
        }

        if deleted > 0 {
            info!(deleted, "swept expired api tokens");
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use crate::{
        auth::{ApiTokenOrder, Pagination},
        store::{Document, Filter, ID_FIELD},
        test::context::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn issued_bearer_authenticates_and_touch_records_use() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        let issued = ctx.issue(owner, Some("n1"), None).await?;

        assert!(issued.bearer.starts_with("n1."), "bearer was {}", issued.bearer);
        assert_eq!(issued.bearer.len(), "n1.".len() + 21);

        let requester = ctx.service.authenticate(&ctx.ctx, &issued.bearer).await?;

        assert_eq!(requester.token_uuid, issued.token.uuid);
        assert_eq!(requester.owner_uuid, owner);
        assert_eq!(requester.owner_nano_id, "n1");

        ctx.clock.advance(SignedDuration::from_secs(3));

        ctx.service
            .touch_last_used(&ctx.ctx, &requester.owner_nano_id, requester.value_hash)
            .await?;

        let view = ctx
            .service
            .get_api_token(&ctx.ctx, None, issued.token.uuid)
            .await?;

        assert_eq!(view.token.last_used_at, Some(ctx.clock.now()));
        assert!(view.token.updated_at >= view.token.created_at, "updated_at moved backwards");

        Ok(())
    }

    #[tokio::test]
    async fn stored_hash_matches_issued_secret() -> TestResult {
        let ctx = TestContext::new();

        let issued = ctx.issue(OwnerUuid::new(), Some("n1"), None).await?;
        let parsed = parse_bearer(&issued.bearer)?;

        assert_eq!(parsed.value_hash, issued.token.value_hash);
        assert_eq!(parsed.value_hash, issued.secret.value_hash());

        Ok(())
    }

    #[tokio::test]
    async fn revoked_tokens_are_rejected_until_reactivated() -> TestResult {
        let ctx = TestContext::new();
        let issued = ctx.issue(OwnerUuid::new(), Some("n1"), None).await?;
        let uuid = issued.token.uuid;

        ctx.service.revoke_api_token(&ctx.ctx, None, uuid).await?;
        let again = ctx.service.revoke_api_token(&ctx.ctx, None, uuid).await?;
        assert_eq!(again.status, TokenStatus::Revoked, "revoke is idempotent");

        let rejected = ctx.service.authenticate(&ctx.ctx, &issued.bearer).await;
        assert!(
            matches!(rejected, Err(ApiTokensServiceError::UnableToValidateUserApiToken)),
            "expected UnableToValidateUserApiToken, got {rejected:?}"
        );

        ctx.service.activate_api_token(&ctx.ctx, None, uuid).await?;
        let again = ctx.service.activate_api_token(&ctx.ctx, None, uuid).await?;
        assert_eq!(again.status, TokenStatus::Active, "activate is idempotent");

        ctx.service.authenticate(&ctx.ctx, &issued.bearer).await?;

        Ok(())
    }

    #[tokio::test]
    async fn malformed_bearers_report_invalid_format() {
        let ctx = TestContext::new();

        for bearer in ["onlyonesegment", ".abc", "abc."] {
            let result = ctx.service.authenticate(&ctx.ctx, bearer).await;

            assert!(
                matches!(result, Err(ApiTokensServiceError::InvalidApiFormat)),
                "{bearer:?}: expected InvalidApiFormat, got {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_nano_id_are_indistinguishable() -> TestResult {
        let ctx = TestContext::new();
        ctx.issue(OwnerUuid::new(), Some("n1"), None).await?;

        for bearer in ["n1.AAAAAAAAAAAAAAAAAAAAA", "nobody.AAAAAAAAAAAAAAAAAAAAA"] {
            let result = ctx.service.authenticate(&ctx.ctx, bearer).await;

            assert!(
                matches!(result, Err(ApiTokensServiceError::UnableToValidateUserApiToken)),
                "{bearer:?}: expected UnableToValidateUserApiToken, got {result:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn touch_with_unknown_hash_reports_no_match() -> TestResult {
        let ctx = TestContext::new();
        ctx.issue(OwnerUuid::new(), Some("n1"), None).await?;

        let result = ctx
            .service
            .touch_last_used(&ctx.ctx, "n1", ValueHash::digest(b"wrong"))
            .await;

        assert!(
            matches!(result, Err(ApiTokensServiceError::NoMatchingUserApiToken)),
            "expected NoMatchingUserApiToken, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn ephemeral_tokens_expire_and_are_reaped_on_list() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let issued = ctx.issue(owner, Some("n1"), Some(1)).await?;

        ctx.clock.advance(SignedDuration::from_millis(500));
        ctx.service.authenticate(&ctx.ctx, &issued.bearer).await?;

        ctx.clock.advance(SignedDuration::from_millis(700));

        let page = ctx
            .service
            .list_api_tokens_for_owner(&ctx.ctx, "n1", ApiTokenQuery::default())
            .await?;

        assert_eq!(page.total, 0);
        assert!(page.items.is_empty(), "expired token listed");
        assert!(ctx.store.is_empty("api_tokens"), "expired token not deleted");

        let result = ctx.service.authenticate(&ctx.ctx, &issued.bearer).await;
        assert!(
            matches!(result, Err(ApiTokensServiceError::UnableToValidateUserApiToken)),
            "expected UnableToValidateUserApiToken, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn expired_tokens_cannot_authenticate_before_any_list() -> TestResult {
        let ctx = TestContext::new();
        let issued = ctx.issue(OwnerUuid::new(), Some("n1"), Some(1)).await?;

        ctx.clock.advance(SignedDuration::from_secs(1));

        let result = ctx.service.authenticate(&ctx.ctx, &issued.bearer).await;

        assert!(
            matches!(result, Err(ApiTokensServiceError::UnableToValidateUserApiToken)),
            "expected UnableToValidateUserApiToken, got {result:?}"
        );

        let lookup = ctx
            .service
            .get_api_token(&ctx.ctx, None, issued.token.uuid)
            .await;

        assert!(
            matches!(lookup, Err(ApiTokensServiceError::ResourceNotFound)),
            "expected ResourceNotFound, got {lookup:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn pages_are_shaped_from_the_total() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        for _ in 0..27 {
            ctx.issue(owner, Some("n1"), None).await?;
        }

        let query = |page| ApiTokenQuery {
            pagination: Pagination::new(Some(page), Some(10)),
            ..ApiTokenQuery::default()
        };

        let first = ctx
            .service
            .list_api_tokens_for_owner(&ctx.ctx, "n1", query(1))
            .await?;

        assert_eq!(first.items.len(), 10);
        assert_eq!((first.total, first.total_pages), (27, 3));

        let last = ctx
            .service
            .list_api_tokens_for_owner(&ctx.ctx, "n1", query(3))
            .await?;

        assert_eq!(last.items.len(), 7);
        assert_eq!(last.page, 3);

        let beyond = ctx
            .service
            .list_api_tokens_for_owner(&ctx.ctx, "n1", query(4))
            .await?;

        assert!(beyond.items.is_empty(), "lenient paging returns an empty page");

        let strict = ctx
            .service
            .list_api_tokens_for_owner(
                &ctx.ctx,
                "n1",
                ApiTokenQuery {
                    strict: true,
                    ..query(4)
                },
            )
            .await;

        assert!(
            matches!(strict, Err(ApiTokensServiceError::PageOutOfRange)),
            "expected PageOutOfRange, got {strict:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_lists_like_the_default() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        for _ in 0..5 {
            ctx.issue(owner, Some("n1"), None).await?;
            ctx.clock.advance(SignedDuration::from_secs(1));
        }

        let list = |order: &str| ApiTokenQuery {
            order: ApiTokenOrder::from(order),
            ..ApiTokenQuery::default()
        };

        let nonsense = ctx.service.list_api_tokens(&ctx.ctx, list("nonsense")).await?;
        let default = ctx
            .service
            .list_api_tokens(&ctx.ctx, list("created_at_desc"))
            .await?;

        assert_eq!(nonsense, default);

        let newest = nonsense.items.first().map(|view| view.token.created_at);
        let oldest = nonsense.items.last().map(|view| view.token.created_at);
        assert!(newest > oldest, "default order is newest first");

        Ok(())
    }

    #[tokio::test]
    async fn lifetime_filters_are_exclusive() {
        let ctx = TestContext::new();

        let result = ctx
            .service
            .list_api_tokens(
                &ctx.ctx,
                ApiTokenQuery {
                    only_ephemeral: true,
                    only_permanent: true,
                    ..ApiTokenQuery::default()
                },
            )
            .await;

        assert!(
            matches!(result, Err(ApiTokensServiceError::InvalidQuery(_))),
            "expected InvalidQuery, got {result:?}"
        );
    }

    #[tokio::test]
    async fn lifetime_filters_split_tokens() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        ctx.issue(owner, Some("n1"), Some(3_600)).await?;
        ctx.issue(owner, Some("n1"), None).await?;
        ctx.issue(owner, Some("n1"), None).await?;

        let ephemeral = ctx
            .service
            .list_api_tokens(
                &ctx.ctx,
                ApiTokenQuery {
                    only_ephemeral: true,
                    ..ApiTokenQuery::default()
                },
            )
            .await?;

        assert_eq!(ephemeral.total, 1);
        assert!(
            ephemeral
                .items
                .first()
                .and_then(|view| view.expires_in.as_deref())
                .is_some_and(|expires_in| expires_in.starts_with("in ")),
            "ephemeral token should describe its expiry"
        );

        let permanent = ctx
            .service
            .list_api_tokens(
                &ctx.ctx,
                ApiTokenQuery {
                    only_permanent: true,
                    ..ApiTokenQuery::default()
                },
            )
            .await?;

        assert_eq!(permanent.total, 2);

        Ok(())
    }

    #[tokio::test]
    async fn issuance_requires_an_owner() {
        let ctx = TestContext::new();

        let result = ctx
            .service
            .issue_api_token(
                &ctx.ctx,
                NewApiToken {
                    owner_uuid: OwnerUuid::from_uuid(uuid::Uuid::nil()),
                    owner_nano_id: Some("n1".to_owned()),
                    description: None,
                    ttl_seconds: None,
                },
            )
            .await;

        assert!(
            matches!(result, Err(ApiTokensServiceError::RequiredUserIdMissing)),
            "expected RequiredUserIdMissing, got {result:?}"
        );
    }

    #[tokio::test]
    async fn tokens_without_nano_id_get_a_raw_bearer() -> TestResult {
        let ctx = TestContext::new();

        let issued = ctx.issue(OwnerUuid::new(), None, None).await?;

        assert_eq!(issued.bearer, issued.secret.expose());
        assert!(issued.token.owner_nano_id.is_none(), "no nano id stored");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let issued = ctx.issue(OwnerUuid::new(), Some("n1"), None).await?;

        let result = ctx
            .service
            .set_api_token_status(&ctx.ctx, None, issued.token.uuid, "PAUSED")
            .await;

        assert!(
            matches!(result, Err(ApiTokensServiceError::TokenStatusInvalid)),
            "expected TokenStatusInvalid, got {result:?}"
        );

        let revoked = ctx
            .service
            .set_api_token_status(&ctx.ctx, None, issued.token.uuid, "revoked")
            .await?;

        assert_eq!(revoked.status, TokenStatus::Revoked);

        Ok(())
    }

    #[tokio::test]
    async fn scoped_operations_hide_other_owners_tokens() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let stranger = OwnerUuid::new();
        let issued = ctx.issue(owner, Some("n1"), None).await?;
        let uuid = issued.token.uuid;

        let lookup = ctx.service.get_api_token(&ctx.ctx, Some(stranger), uuid).await;
        assert!(
            matches!(lookup, Err(ApiTokensServiceError::ResourceNotFound)),
            "expected ResourceNotFound, got {lookup:?}"
        );

        let revoke = ctx.service.revoke_api_token(&ctx.ctx, Some(stranger), uuid).await;
        assert!(
            matches!(revoke, Err(ApiTokensServiceError::ResourceNotFound)),
            "expected ResourceNotFound, got {revoke:?}"
        );

        ctx.service.delete_api_token(&ctx.ctx, stranger, uuid).await?;
        assert_eq!(ctx.store.len("api_tokens"), 1, "stranger cannot delete");

        ctx.service.delete_api_token(&ctx.ctx, owner, uuid).await?;
        assert!(ctx.store.is_empty("api_tokens"), "owner deletes own token");

        Ok(())
    }

    #[tokio::test]
    async fn owner_cascade_removes_only_their_tokens() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        ctx.issue(owner, Some("n1"), None).await?;
        ctx.issue(owner, Some("n1"), Some(60)).await?;
        ctx.issue(OwnerUuid::new(), Some("n2"), None).await?;

        let deleted = ctx
            .service
            .delete_all_api_tokens_by_owner(&ctx.ctx, owner)
            .await?;

        assert_eq!(deleted, 2);
        assert_eq!(ctx.store.len("api_tokens"), 1);

        Ok(())
    }

    #[tokio::test]
    async fn sweep_deletes_expired_tokens_without_listing() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        ctx.issue(owner, Some("n1"), Some(1)).await?;
        ctx.issue(owner, Some("n1"), Some(3_600)).await?;
        ctx.issue(owner, Some("n1"), None).await?;

        ctx.clock.advance(SignedDuration::from_secs(2));

        assert_eq!(ctx.service.sweep_expired_api_tokens(&ctx.ctx).await?, 1);
        assert_eq!(ctx.store.len("api_tokens"), 2);

        Ok(())
    }

    #[tokio::test]
    async fn sweep_keeps_unreadable_and_empty_expiries() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        let unreadable = ctx.issue(owner, Some("n1"), None).await?;
        let empty = ctx.issue(owner, Some("n1"), None).await?;

        for (uuid, ttl) in [
            (unreadable.token.uuid, "2020-13-45 garbage"),
            (empty.token.uuid, ""),
        ] {
            let mut patch = Document::new();
            patch.insert("ttl_expires_at".to_owned(), ttl.into());

            ctx.store
                .update_one(
                    &ctx.ctx,
                    "api_tokens",
                    &Filter::new().equals(ID_FIELD, uuid.to_string()),
                    patch,
                )
                .await?;
        }

        ctx.clock.advance(SignedDuration::from_hours(24));

        assert_eq!(ctx.service.sweep_expired_api_tokens(&ctx.ctx).await?, 0);
        assert_eq!(ctx.store.len("api_tokens"), 2);

        let permanent = ctx
            .service
            .list_api_tokens(
                &ctx.ctx,
                ApiTokenQuery {
                    only_permanent: true,
                    ..ApiTokenQuery::default()
                },
            )
            .await?;

        let uuids: Vec<ApiTokenUuid> = permanent.items.iter().map(|view| view.token.uuid).collect();

        assert_eq!(uuids, vec![empty.token.uuid], "empty expiry reads as permanent");

        Ok(())
    }

    #[tokio::test]
    async fn creation_window_is_half_open() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let start = ctx.clock.now();

        ctx.issue(owner, Some("n1"), None).await?;
        ctx.clock.advance(SignedDuration::from_secs(10));
        let inside = ctx.issue(owner, Some("n1"), None).await?;
        ctx.clock.advance(SignedDuration::from_secs(10));
        ctx.issue(owner, Some("n1"), None).await?;

        let page = ctx
            .service
            .list_api_tokens(
                &ctx.ctx,
                ApiTokenQuery {
                    created_from: Some(start.checked_add(SignedDuration::from_secs(10))?),
                    created_to: Some(start.checked_add(SignedDuration::from_secs(20))?),
                    ..ApiTokenQuery::default()
                },
            )
            .await?;

        let uuids: Vec<ApiTokenUuid> = page.items.iter().map(|view| view.token.uuid).collect();

        assert_eq!(page.total, 1);
        assert_eq!(uuids, vec![inside.token.uuid], "from is inclusive, to is exclusive");

        Ok(())
    }

    #[tokio::test]
    async fn inverted_creation_window_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let now = ctx.clock.now();

        let result = ctx
            .service
            .list_api_tokens(
                &ctx.ctx,
                ApiTokenQuery {
                    created_from: Some(now),
                    created_to: Some(now.checked_sub(SignedDuration::from_secs(1))?),
                    ..ApiTokenQuery::default()
                },
            )
            .await;

        assert!(
            matches!(result, Err(ApiTokensServiceError::InvalidQuery(_))),
            "expected InvalidQuery, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn views_describe_relative_times() -> TestResult {
        let ctx = TestContext::new();
        let issued = ctx.issue(OwnerUuid::new(), Some("n1"), Some(120)).await?;

        ctx.clock.advance(SignedDuration::from_secs(60));

        let view = ctx
            .service
            .get_api_token(&ctx.ctx, None, issued.token.uuid)
            .await?;

        assert!(view.created_ago.ends_with(" ago"), "got {}", view.created_ago);
        assert_ne!(view.created_ago, "0s ago");
        assert!(
            view.expires_in
                .as_deref()
                .is_some_and(|expires_in| expires_in.starts_with("in ")),
            "got {:?}",
            view.expires_in
        );
        assert_eq!(view.last_used_ago, None);

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_context_stops_issuance() {
        let ctx = TestContext::new();
        let cancelled = Context::background();
        cancelled.cancel();

        let result = ctx
            .service
            .issue_api_token(
                &cancelled,
                NewApiToken {
                    owner_uuid: OwnerUuid::new(),
                    owner_nano_id: Some("n1".to_owned()),
                    description: None,
                    ttl_seconds: None,
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(ApiTokensServiceError::Store(crate::store::StoreError::Cancelled))
            ),
            "expected a cancelled store error, got {result:?}"
        );
        assert!(ctx.store.is_empty("api_tokens"), "nothing written");
    }
}
