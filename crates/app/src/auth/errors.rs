//! API token service errors.

use thiserror::Error;

use crate::{auth::ApiTokenError, store::StoreError};

#[derive(Debug, Error)]
pub enum ApiTokensServiceError {
    /// No token under the owner carries the presented hash.
    #[error("no matching api token for user")]
    NoMatchingUserApiToken,

    /// Authentication failed. Deliberately silent about why.
    #[error("unable to validate user api token")]
    UnableToValidateUserApiToken,

    #[error("unable to find required headers")]
    UnableToFindRequiredHeaders,

    #[error("invalid api token format")]
    InvalidApiFormat,

    #[error("resource not found")]
    ResourceNotFound,

    #[error("required user id missing")]
    RequiredUserIdMissing,

    #[error("page out of range")]
    PageOutOfRange,

    #[error("token status invalid")]
    TokenStatusInvalid,

    #[error("invalid query: {0}")]
    InvalidQuery(&'static str),

    #[error("error creating short-lived access token")]
    ErrorCreatingShortLivedAccessToken,

    #[error("storage error")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ApiTokensServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::ResourceNotFound,
            StoreError::Cancelled
            | StoreError::DeadlineExceeded
            | StoreError::AlreadyExists
            | StoreError::MissingId
            | StoreError::Decode(_)
            | StoreError::Json(_)
            | StoreError::Sql(_) => Self::Store(error),
        }
    }
}

impl From<ApiTokenError> for ApiTokensServiceError {
    fn from(error: ApiTokenError) -> Self {
        match error {
            ApiTokenError::InvalidFormat => Self::InvalidApiFormat,
            ApiTokenError::InvalidHashEncoding => {
                Self::Store(StoreError::Decode(error.to_string()))
            }
        }
    }
}
