//! Query parameter parsing.
//!
//! Values arrive as raw strings so a malformed value is rejected instead of
//! being read as absent.

use jiff::Timestamp;

use tollgate_app::auth::ApiTokensServiceError;

use crate::errors::ApiError;

pub(crate) trait QueryParamExt {
    /// Parse an optional RFC 3339 query value.
    fn into_timestamp(self, name: &'static str) -> Result<Option<Timestamp>, ApiError>;

    /// Parse an optional `true`/`false` flag. Absent or blank is `false`.
    fn into_flag(self, name: &'static str) -> Result<bool, ApiError>;
}

impl QueryParamExt for Option<String> {
    fn into_timestamp(self, name: &'static str) -> Result<Option<Timestamp>, ApiError> {
        self.filter(|value| !value.trim().is_empty())
            .map(|value| value.trim().parse::<Timestamp>())
            .transpose()
            .map_err(|_ignored| {
                ApiError::from(ApiTokensServiceError::InvalidQuery(
                    "timestamps must be RFC 3339",
                ))
                .with_detail(format!("could not parse \"{name}\" query parameter"))
            })
    }

    fn into_flag(self, name: &'static str) -> Result<bool, ApiError> {
        let Some(value) = self.filter(|value| !value.trim().is_empty()) else {
            return Ok(false);
        };

        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(
                ApiError::from(ApiTokensServiceError::InvalidQuery("flags must be true or false"))
                    .with_detail(format!("could not parse \"{name}\" query parameter")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_rfc3339_and_skips_blank_values() -> TestResult {
        let parsed = Some("2026-02-21T12:00:00Z".to_owned()).into_timestamp("created_from")?;

        assert_eq!(parsed, Some("2026-02-21T12:00:00Z".parse()?));
        assert_eq!(None::<String>.into_timestamp("created_from")?, None);
        assert_eq!(Some("  ".to_owned()).into_timestamp("created_from")?, None);

        Ok(())
    }

    #[test]
    fn rejects_garbage_with_invalid_query() {
        let result = Some("yesterday".to_owned()).into_timestamp("created_to");

        assert!(
            result.is_err_and(|error| error.code() == Some("APT0-208")),
            "expected an APT0-208 error"
        );
    }

    #[test]
    fn flags_accept_true_and_false_in_any_case() -> TestResult {
        assert!(Some("TRUE".to_owned()).into_flag("strict")?, "TRUE is true");
        assert!(!Some("false".to_owned()).into_flag("strict")?, "false is false");
        assert!(!None::<String>.into_flag("strict")?, "absent is false");
        assert!(!Some(String::new()).into_flag("strict")?, "blank is false");

        Ok(())
    }

    #[test]
    fn flags_reject_other_values() {
        let result = Some("yes".to_owned()).into_flag("only_ephemeral");

        assert!(
            result.is_err_and(|error| error.code() == Some("APT0-208")),
            "expected an APT0-208 error"
        );
    }
}
