//! Listing filters, ordering and pagination.

use jiff::Timestamp;

use crate::auth::{ApiTokensServiceError, OwnerUuid};

/// Default page size.
pub const DEFAULT_PER_PAGE: u64 = 25;

/// Largest page size a caller may ask for.
pub const MAX_PER_PAGE: u64 = 100;

/// Sort order for listings. Unknown wire values fall back to the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiTokenOrder {
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
    LastUsedAtAsc,
    LastUsedAtDesc,
    UpdatedAtAsc,
    UpdatedAtDesc,
}

impl ApiTokenOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAtAsc => "created_at_asc",
            Self::CreatedAtDesc => "created_at_desc",
            Self::LastUsedAtAsc => "last_used_at_asc",
            Self::LastUsedAtDesc => "last_used_at_desc",
            Self::UpdatedAtAsc => "updated_at_asc",
            Self::UpdatedAtDesc => "updated_at_desc",
        }
    }
}

impl From<&str> for ApiTokenOrder {
    fn from(value: &str) -> Self {
        match value {
            "created_at_asc" => Self::CreatedAtAsc,
            "last_used_at_asc" => Self::LastUsedAtAsc,
            "last_used_at_desc" => Self::LastUsedAtDesc,
            "updated_at_asc" => Self::UpdatedAtAsc,
            "updated_at_desc" => Self::UpdatedAtDesc,
            _ => Self::CreatedAtDesc,
        }
    }
}

/// Page selection, always inside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Clamp raw inputs. Absent or zero values take the defaults.
    #[must_use]
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.filter(|page| *page > 0).unwrap_or(1),
            per_page: per_page
                .filter(|per_page| *per_page > 0)
                .map_or(DEFAULT_PER_PAGE, |per_page| per_page.min(MAX_PER_PAGE)),
        }
    }

    #[must_use]
    pub const fn page(self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn per_page(self) -> u64 {
        self.per_page
    }

    #[must_use]
    pub const fn skip(self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// `ceil(total / per_page)`.
    #[must_use]
    pub const fn total_pages(self, total: u64) -> u64 {
        total.div_ceil(self.per_page)
    }
}

/// Conjunctive listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiTokenQuery {
    pub owner_uuid: Option<OwnerUuid>,
    pub owner_nano_id: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub only_ephemeral: bool,
    pub only_permanent: bool,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
    pub order: ApiTokenOrder,
    pub pagination: Pagination,

    /// Report [`ApiTokensServiceError::PageOutOfRange`] instead of an empty page.
    pub strict: bool,
}

impl ApiTokenQuery {
    /// Reject contradictory filters.
    ///
    /// # Errors
    ///
    /// Returns [`ApiTokensServiceError::InvalidQuery`] when both lifetime
    /// filters are set or the creation range is inverted.
    pub fn validate(&self) -> Result<(), ApiTokensServiceError> {
        if self.only_ephemeral && self.only_permanent {
            return Err(ApiTokensServiceError::InvalidQuery(
                "only_ephemeral and only_permanent are mutually exclusive",
            ));
        }

        if let (Some(from), Some(to)) = (self.created_from, self.created_to)
            && from > to
        {
            return Err(ApiTokensServiceError::InvalidQuery(
                "created_from must not be after created_to",
            ));
        }

        Ok(())
    }
}
