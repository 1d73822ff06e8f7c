//! Token request and response bodies.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tollgate_app::auth::{ApiToken, ApiTokenPage, ApiTokenView, IssuedApiToken, TokenStatus};

/// A token as returned over HTTP. Never carries the secret or its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TokenResponse {
    pub uuid: Uuid,
    pub description: String,
    pub status: TokenStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ago: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_ago: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
}

impl From<ApiToken> for TokenResponse {
    fn from(token: ApiToken) -> Self {
        Self {
            uuid: token.uuid.into_uuid(),
            expires_at: token.lifetime.expires_at(),
            description: token.description,
            status: token.status,
            created_at: token.created_at,
            updated_at: token.updated_at,
            last_used_at: token.last_used_at,
            created_ago: None,
            last_used_ago: None,
            expires_in: None,
        }
    }
}

impl From<ApiTokenView> for TokenResponse {
    fn from(view: ApiTokenView) -> Self {
        Self {
            created_ago: Some(view.created_ago),
            last_used_ago: view.last_used_ago,
            expires_in: view.expires_in,
            ..Self::from(view.token)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenPageResponse {
    pub items: Vec<TokenResponse>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub per_page: u64,
}

impl From<ApiTokenPage> for TokenPageResponse {
    fn from(page: ApiTokenPage) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            total_pages: page.total_pages,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

/// Create Token Request
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct CreateTokenRequest {
    /// Free-text label; a codename is generated when blank.
    #[serde(default)]
    pub description: Option<String>,

    /// Lifetime in seconds; absent or zero issues a permanent token.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

/// Token Created Response
///
/// The only response that ever carries the bearer.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenCreatedResponse {
    pub bearer: String,
    pub token: TokenResponse,
}

impl From<IssuedApiToken> for TokenCreatedResponse {
    fn from(issued: IssuedApiToken) -> Self {
        Self {
            bearer: issued.bearer,
            token: issued.token.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UpdateStatusRequest {
    pub status: String,
}
