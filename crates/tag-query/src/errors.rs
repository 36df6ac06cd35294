use refgate_core_types::ValidationError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagQueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed selector '{selector}': {reason}")]
    MalformedSelector {
        selector: String,
        reason: &'static str,
    },
}

impl TagQueryError {
    pub(crate) fn malformed(selector: &str, reason: &'static str) -> Self {
        Self::MalformedSelector {
            selector: selector.to_string(),
            reason,
        }
    }
}

pub type TagQueryResult<T> = Result<T, TagQueryError>;
