//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"errors": [{title, detail?, status, code?}]}`
//! when the request was sent with `Content-Type: application/json`, and as a
//! plain-text line with the same status otherwise.

use std::fmt;

use salvo::{Writer, async_trait, http::header::CONTENT_TYPE, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::error;

use tollgate_app::auth::ApiTokensServiceError;

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ErrorObject {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    pub status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiError {
    status: StatusCode,
    title: &'static str,
    detail: Option<String>,
    code: Option<&'static str>,
}

impl ApiError {
    const fn new(status: StatusCode, title: &'static str, code: Option<&'static str>) -> Self {
        Self {
            status,
            title,
            detail: None,
            code,
        }
    }

    #[must_use]
    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Malformed input the service never saw (bad path id, unreadable body).
    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", None).with_detail(detail)
    }

    pub(crate) const fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            None,
        )
    }

    pub(crate) const fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub(crate) const fn code(&self) -> Option<&'static str> {
        self.code
    }

    fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            errors: vec![ErrorObject {
                title: self.title.to_owned(),
                detail: self.detail.clone(),
                status: self.status.as_u16(),
                code: self.code.map(str::to_owned),
            }],
        }
    }

    fn plain_text(&self) -> String {
        match (&self.code, &self.detail) {
            (Some(code), Some(detail)) => format!("{code}: {}: {detail}", self.title),
            (Some(code), None) => format!("{code}: {}", self.title),
            (None, Some(detail)) => format!("{}: {detail}", self.title),
            (None, None) => self.title.to_owned(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain_text())
    }
}

impl std::error::Error for ApiError {}

impl From<ApiTokensServiceError> for ApiError {
    fn from(error: ApiTokensServiceError) -> Self {
        match error {
            ApiTokensServiceError::NoMatchingUserApiToken => Self::new(
                StatusCode::UNAUTHORIZED,
                "No Matching User API Token",
                Some("APT0-200"),
            ),
            ApiTokensServiceError::UnableToValidateUserApiToken => Self::new(
                StatusCode::UNAUTHORIZED,
                "Unable To Validate User API Token",
                Some("APT0-201"),
            ),
            ApiTokensServiceError::UnableToFindRequiredHeaders => Self::new(
                StatusCode::UNAUTHORIZED,
                "Unable To Find Required Headers",
                Some("APT0-202"),
            )
            .with_detail("missing X-Api-Token header"),
            ApiTokensServiceError::InvalidApiFormat => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid API Format",
                Some("APT0-203"),
            ),
            ApiTokensServiceError::ResourceNotFound => Self::new(
                StatusCode::NOT_FOUND,
                "Resource Not Found",
                Some("APT0-204"),
            ),
            ApiTokensServiceError::RequiredUserIdMissing => Self::new(
                StatusCode::BAD_REQUEST,
                "Required User ID Missing",
                Some("APT0-205"),
            ),
            ApiTokensServiceError::PageOutOfRange => Self::new(
                StatusCode::BAD_REQUEST,
                "Page Out Of Range",
                Some("APT0-206"),
            ),
            ApiTokensServiceError::TokenStatusInvalid => Self::new(
                StatusCode::BAD_REQUEST,
                "Token Status Invalid",
                Some("APT0-207"),
            )
            .with_detail("status must be ACTIVE or REVOKED"),
            ApiTokensServiceError::InvalidQuery(reason) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid Query", Some("APT0-208"))
                    .with_detail(reason)
            }
            ApiTokensServiceError::ErrorCreatingShortLivedAccessToken => {
                error!("failed to derive api token expiry");

                Self::internal()
            }
            ApiTokensServiceError::Store(source) => {
                error!("api token store failure: {source}");

                Self::internal()
            }
        }
    }
}

fn wants_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"))
}

#[async_trait]
impl Writer for ApiError {
    async fn write(self, req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        res.status_code(self.status());

        if wants_json(req) {
            res.render(Json(self.envelope()));
        } else {
            res.render(Text::Plain(self.plain_text()));
        }
    }
}
