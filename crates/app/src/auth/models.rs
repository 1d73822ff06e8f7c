//! API token models.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{ApiTokenSecret, ApiTokensServiceError, ValueHash},
    store::StoreError,
    uuids::TypedUuid,
};

/// API token UUID
pub type ApiTokenUuid = TypedUuid<ApiToken>;

/// Principal that owns tokens.
#[derive(Debug)]
pub struct Owner;

/// Owner UUID
pub type OwnerUuid = TypedUuid<Owner>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStatus {
    Active,
    Revoked,
}

impl TokenStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Revoked => "REVOKED",
        }
    }

    /// Lenient read used for stored documents: anything but `ACTIVE` is revoked.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Revoked)
    }
}

impl FromStr for TokenStatus {
    type Err = ApiTokensServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("ACTIVE") {
            Ok(Self::Active)
        } else if value.eq_ignore_ascii_case("REVOKED") {
            Ok(Self::Revoked)
        } else {
            Err(ApiTokensServiceError::TokenStatusInvalid)
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When, if ever, a token stops existing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLifetime {
    Permanent,
    Ephemeral(Timestamp),

    /// A stored expiry that could not be parsed. Kept as-is and never reaped.
    Unreadable(String),
}

impl TokenLifetime {
    #[must_use]
    pub const fn expires_at(&self) -> Option<Timestamp> {
        match self {
            Self::Ephemeral(expires_at) => Some(*expires_at),
            Self::Permanent | Self::Unreadable(_) => None,
        }
    }

    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }
}

/// API Token Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken {
    pub uuid: ApiTokenUuid,
    pub value_hash: ValueHash,
    pub status: TokenStatus,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub lifetime: TokenLifetime,
    pub owner_uuid: OwnerUuid,
    pub owner_nano_id: Option<String>,
}

/// New API Token Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiToken {
    pub owner_uuid: OwnerUuid,
    pub owner_nano_id: Option<String>,
    pub description: Option<String>,
    pub ttl_seconds: Option<u64>,
}

/// Patch applied by `update`. `updated_at` is always set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiTokenPatch {
    pub status: Option<TokenStatus>,
    pub last_used_at: Option<Timestamp>,
}

/// Issuance result. The bearer is only ever available here.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub bearer: String,
    pub secret: ApiTokenSecret,
    pub token: ApiToken,
}

/// Identity established by a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub owner_uuid: OwnerUuid,
    pub owner_nano_id: String,
    pub token_uuid: ApiTokenUuid,
    pub value_hash: ValueHash,
}

/// A token plus human-readable relative times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTokenView {
    pub token: ApiToken,
    pub created_ago: String,
    pub last_used_ago: Option<String>,
    pub expires_in: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTokenPage {
    pub items: Vec<ApiTokenView>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Persisted document shape. The plaintext secret has no field here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ApiTokenDocument {
    #[serde(rename = "_id")]
    pub id: String,

    pub value_sha: String,

    pub status: String,

    #[serde(default)]
    pub description: String,

    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,

    pub updated_at: String,

    pub created_by_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_nid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_expires_at: Option<String>,
}

/// RFC 3339 with fixed nanosecond precision, so stored timestamps sort as strings.
#[must_use]
pub fn format_timestamp(timestamp: Timestamp) -> String {
    format!("{timestamp:.9}")
}

fn parse_timestamp(field: &str, raw: &str) -> Result<Timestamp, StoreError> {
    raw.parse()
        .map_err(|error| StoreError::Decode(format!("{field}: {error}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl From<&ApiToken> for ApiTokenDocument {
    fn from(token: &ApiToken) -> Self {
        Self {
            id: token.uuid.to_string(),
            value_sha: token.value_hash.to_hex(),
            status: token.status.as_str().to_owned(),
            description: token.description.clone(),
            created_at: format_timestamp(token.created_at),
            last_used_at: token.last_used_at.map(format_timestamp),
            updated_at: format_timestamp(token.updated_at),
            created_by_id: token.owner_uuid.to_string(),
            created_by_nid: token.owner_nano_id.clone(),
            ttl_expires_at: match &token.lifetime {
                TokenLifetime::Permanent => None,
                TokenLifetime::Ephemeral(expires_at) => Some(format_timestamp(*expires_at)),
                TokenLifetime::Unreadable(raw) => Some(raw.clone()),
            },
        }
    }
}

impl TryFrom<ApiTokenDocument> for ApiToken {
    type Error = StoreError;

    fn try_from(document: ApiTokenDocument) -> Result<Self, Self::Error> {
        let lifetime = match non_empty(document.ttl_expires_at) {
            None => TokenLifetime::Permanent,
            Some(raw) => raw
                .parse()
                .map_or(TokenLifetime::Unreadable(raw), TokenLifetime::Ephemeral),
        };

        Ok(Self {
            uuid: document
                .id
                .parse()
                .map_err(|error| StoreError::Decode(format!("_id: {error}")))?,
            value_hash: ValueHash::from_hex(&document.value_sha)
                .map_err(|error| StoreError::Decode(format!("value_sha: {error}")))?,
            status: TokenStatus::coerce(&document.status),
            description: document.description,
            created_at: parse_timestamp("created_at", &document.created_at)?,
            updated_at: parse_timestamp("updated_at", &document.updated_at)?,
            last_used_at: non_empty(document.last_used_at)
                .map(|raw| parse_timestamp("last_used_at", &raw))
                .transpose()?,
            lifetime,
            owner_uuid: document
                .created_by_id
                .parse()
                .map_err(|error| StoreError::Decode(format!("created_by_id: {error}")))?,
            owner_nano_id: non_empty(document.created_by_nid),
        })
    }
}
