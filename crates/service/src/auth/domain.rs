use serde::{Deserialize, Serialize};
use tracing::{error, debug};

use models::{AccountView, Role};

use super::errors::AuthError;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Absent means [`Role::Employee`].
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

/// Engine operations, used to label flattened internal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    ForgotPassword,
    ResetPassword,
    ListAccounts,
    GetAccount,
    DeleteAccount,
    DeactivateAccount,
}

impl Operation {
    fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::Register => "Registration failed",
            Operation::Login => "Login failed",
            Operation::ForgotPassword => "Failed to generate reset token",
            Operation::ResetPassword => "Password reset failed",
            Operation::ListAccounts => "Failed to list users",
            Operation::GetAccount => "Failed to load user",
            Operation::DeleteAccount => "Failed to delete user",
            Operation::DeactivateAccount => "Failed to deactivate user",
        }
    }

    /// User-facing text for a failed operation.
    pub fn render(&self, err: &AuthError) -> String {
        if err.is_internal() {
            format!("{}: {}", self.failure_prefix(), err)
        } else {
            err.to_string()
        }
    }
}

/// Uniform outcome of every engine operation, as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AccountView>,
}

impl AuthResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), token: None, user: None }
    }

    pub fn session(message: impl Into<String>, token: String, user: AccountView) -> Self {
        Self { success: true, message: message.into(), token: Some(token), user: Some(user) }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), token: None, user: None }
    }

    /// Flatten a tagged outcome into the external contract.
    pub fn from_outcome(op: Operation, outcome: Result<AuthResult, AuthError>) -> Self {
        match outcome {
            Ok(result) => result,
            Err(e) => {
                if e.is_internal() {
                    error!(operation = ?op, code = e.code(), error = %e, "operation failed");
                } else {
                    debug!(operation = ?op, code = e.code(), error = %e, "operation rejected");
                }
                AuthResult::failure(op.render(&e))
            }
        }
    }
}
