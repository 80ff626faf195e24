use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid placeholder key: {0}")]
    InvalidPlaceholderKey(String),
    #[error("line field {key} must carry exactly one of value or lookup")]
    AmbiguousLineField { key: String },
    #[error("unknown header type: {0}")]
    UnknownHeaderType(String),
    #[error("unknown match behavior: {0}")]
    UnknownMatchBehavior(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
