use thiserror::Error;

/// Rejection raised at the validation boundary, before anything is parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} exceeds {max} characters (got {len})")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },
    #[error("invalid {kind}: '{value}'")]
    Malformed { kind: &'static str, value: String },
}

impl ValidationError {
    pub fn malformed(kind: &'static str, value: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooLong { kind, .. } | Self::Malformed { kind, .. } => kind,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
