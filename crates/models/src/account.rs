use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Closed set of roles an account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EMPLOYEE" => Ok(Role::Employee),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ModelError::UnknownRole(other.to_string())),
        }
    }
}

/// A reset that has been issued but not yet consumed.
///
/// Token and expiry travel together, so one can never be set without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReset {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Persisted account record, secrets included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reset: Option<PendingReset>,
}

impl Account {
    /// New active account with a fresh identifier.
    pub fn new(username: &str, email: &str, full_name: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            password_hash,
            role,
            active: true,
            created_at: Utc::now(),
            last_login: None,
            reset: None,
        }
    }

    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

/// What callers outside the core get to see of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            email: a.email.clone(),
            full_name: a.full_name.clone(),
            role: a.role,
            active: a.active,
            created_at: a.created_at,
            last_login: a.last_login,
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() {
        return Err(ModelError::Validation("username required".into()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ModelError::Validation("invalid email".into()));
    };
    if local.is_empty() || domain.is_empty() {
        return Err(ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_employee() {
        assert_eq!(Role::default(), Role::Employee);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" EMPLOYEE ".parse::<Role>(), Ok(Role::Employee));
        assert!("ROOT".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn view_hides_secrets() {
        let mut acc = Account::new("alice", "a@x.com", "Alice A", "$argon2id$hash".into(), Role::Employee);
        acc.reset = Some(PendingReset { token: "tok".into(), expires_at: Utc::now() });
        let json = serde_json::to_value(acc.view()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("passwordHash"));
        assert!(!obj.contains_key("reset"));
        assert_eq!(obj["username"], "alice");
        assert_eq!(obj["role"], "EMPLOYEE");
        assert!(!json.to_string().contains("tok"));
    }

    #[test]
    fn new_account_is_active_without_reset() {
        let acc = Account::new("bob", "b@x.com", "Bob", "h".into(), Role::Admin);
        assert!(acc.active);
        assert!(acc.reset.is_none());
        assert!(acc.last_login.is_none());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("ax.com").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@").is_err());
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username("").is_err());
        // only emptiness is refused
        assert!(validate_username("al ice").is_ok());
    }
}
