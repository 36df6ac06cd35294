use refgate_core_types::{Role, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid auth config: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("unsupported config path: {0}")]
    UnsupportedPath(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("unknown role '{0}' in role hierarchy")]
    UnknownRole(String),
    #[error("role hierarchy has a cycle through {0}")]
    HierarchyCycle(Role),
}

impl From<ValidationError> for PolicyError {
    fn from(value: ValidationError) -> Self {
        PolicyError::InvalidValue(value.to_string())
    }
}

pub type PolicyResult<T> = Result<T, PolicyError>;
