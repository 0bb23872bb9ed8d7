use thiserror::Error;

use crate::api_client::ApiError;

/// Local contract violations. These are raised before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query requires a date range or a single date")]
    MissingRequiredDate,
    #[error("filter request must contain at least one condition")]
    EmptyConditionSet,
    #[error("filter condition {index} needs a date range")]
    MissingConditionDateRange { index: usize },
    #[error("{target} filters accept entity names only, not identifiers")]
    EntityIdsUnsupported { target: &'static str },

    #[error("page must be >= 1, got {page}")]
    InvalidPage { page: u32 },
    #[error("page_size {page_size} is outside the allowed range 1..={max}")]
    PageSizeOutOfRange { page_size: u32, max: u32 },

    #[error("trade date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidTradeDate { value: String },

    #[error("matched condition index {index} is out of order or exceeds {count} conditions")]
    MatchedConditionIndex { index: usize, count: usize },
    #[error("{matched} matched conditions reported for a request with {count} conditions")]
    TooManyMatchedConditions { matched: usize, count: usize },

    #[error("config value '{key}' is invalid: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}
