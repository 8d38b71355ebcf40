use thiserror::Error;

/// Coarse failure classes exposed for mapping and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationConflict,
    NotFound,
    Unauthorized,
    DeliveryFailure,
    InternalFailure,
}

/// Business and infrastructure errors for account workflows.
///
/// The `Display` text of business variants is the exact message shown to
/// end users; internal variants get an operation prefix when flattened.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Username already exists!")]
    UsernameTaken,
    #[error("Email already exists!")]
    EmailTaken,
    #[error("Email not found!")]
    EmailNotFound,
    #[error("User not found!")]
    AccountNotFound,
    #[error("Invalid username or password!")]
    InvalidCredentials,
    #[error("Account is deactivated. Contact administrator.")]
    Deactivated,
    #[error("Invalid reset token!")]
    InvalidResetToken,
    #[error("Reset token has expired!")]
    ResetTokenExpired,
    #[error("Invalid or expired session token")]
    InvalidSession,
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::UsernameTaken | AuthError::EmailTaken => ErrorKind::ValidationConflict,
            AuthError::EmailNotFound | AuthError::AccountNotFound => ErrorKind::NotFound,
            AuthError::InvalidCredentials
            | AuthError::Deactivated
            | AuthError::InvalidResetToken
            | AuthError::ResetTokenExpired
            | AuthError::InvalidSession => ErrorKind::Unauthorized,
            AuthError::Delivery(_) => ErrorKind::DeliveryFailure,
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => ErrorKind::InternalFailure,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::UsernameTaken => 1002,
            AuthError::EmailTaken => 1003,
            AuthError::EmailNotFound => 1010,
            AuthError::AccountNotFound => 1011,
            AuthError::InvalidCredentials => 1020,
            AuthError::Deactivated => 1021,
            AuthError::InvalidResetToken => 1022,
            AuthError::ResetTokenExpired => 1023,
            AuthError::InvalidSession => 1024,
            AuthError::Delivery(_) => 1050,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::InternalFailure
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        AuthError::Validation(e.to_string())
    }
}
