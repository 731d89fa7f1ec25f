//! Error taxonomy shared by the scraper core and the route layer.

use thiserror::Error;

use crate::scraper::encoding::EncodingError;

/// Everything that can go wrong between fetching a page and returning a record.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The requested entity does not exist on Tibia.com.
    #[error("{0} not found")]
    NotFound(String),

    /// The page was fetched but did not have the expected structure.
    #[error("unexpected page structure in {assembler}: {section}")]
    ParseShapeMismatch {
        assembler: &'static str,
        section: String,
    },

    /// A caller-supplied parameter was rejected before fetching.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// The house reference table could not be loaded.
    #[error("reference data unavailable")]
    ReferenceDataUnavailable,

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("unparseable date/time: {0:?}")]
    DateTime(String),

    /// Tibia.com redirected to its maintenance page.
    #[error("Tibia.com is under maintenance")]
    Maintenance,

    /// Network failure or unreadable response body.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream answered with status {0}")]
    UpstreamStatus(u16),
}

impl ScrapeError {
    pub fn shape(assembler: &'static str, section: impl Into<String>) -> Self {
        let section = section.into();
        tracing::warn!(assembler, section = %section, "page did not match expected shape");
        Self::ParseShapeMismatch { assembler, section }
    }

    /// Short machine-readable kind used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::NotFound(_) => "not_found",
            ScrapeError::ParseShapeMismatch { .. } => "parse_shape_mismatch",
            ScrapeError::Validation(_) => "validation",
            ScrapeError::ReferenceDataUnavailable => "reference_data_unavailable",
            ScrapeError::Encoding(_) => "encoding",
            ScrapeError::DateTime(_) => "datetime",
            ScrapeError::Maintenance => "maintenance",
            ScrapeError::Upstream(_) | ScrapeError::UpstreamStatus(_) => "upstream",
        }
    }

    /// Whether retrying the same fetch could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Upstream(_) => true,
            ScrapeError::UpstreamStatus(status) => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
