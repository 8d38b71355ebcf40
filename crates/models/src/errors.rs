use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}
