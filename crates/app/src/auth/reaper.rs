//! Lazy TTL enforcement.
//!
//! Every read path that hands tokens back runs them through [`reap`], so an
//! expired ephemeral token is never returned even if no sweep has run.

use jiff::Timestamp;
use tracing::warn;

use crate::{
    auth::{ApiToken, TokenLifetime, repository::ApiTokensRepository},
    store::Context,
};

/// Tokens that survived a reap and how many were dropped.
#[derive(Debug, Default)]
pub(crate) struct Reaped {
    pub kept: Vec<ApiToken>,
    pub omitted: u64,
}

/// `true` once `now` has reached the token's expiry.
pub(crate) fn is_expired(token: &ApiToken, now: Timestamp) -> bool {
    matches!(token.lifetime, TokenLifetime::Ephemeral(expires_at) if now >= expires_at)
}

/// Drop expired tokens from `tokens` and delete them from the store.
///
/// Deletes are best-effort: a failure is logged and the record stays for the
/// next pass. Unparseable expiries are kept.
pub(crate) async fn reap(
    repository: &ApiTokensRepository,
    ctx: &Context,
    tokens: Vec<ApiToken>,
    now: Timestamp,
) -> Reaped {
    let mut reaped = Reaped {
        kept: Vec::with_capacity(tokens.len()),
        omitted: 0,
    };

    for token in tokens {
        if let TokenLifetime::Unreadable(raw) = &token.lifetime {
            warn!(
                token_uuid = %token.uuid,
                ttl_expires_at = %raw,
                "unable to parse token expiry; keeping token"
            );
        }

        if !is_expired(&token, now) {
            reaped.kept.push(token);
            continue;
        }

        reaped.omitted += 1;

        if let Err(error) = repository.delete(ctx, token.uuid).await {
            warn!(
                token_uuid = %token.uuid,
                error = %error,
                "failed to delete expired api token"
            );
        }
    }

    reaped
}
