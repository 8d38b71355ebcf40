use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use models::{account, Account, AccountView};

use super::domain::{AuthResult, ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput};
use super::errors::AuthError;
use super::notifier::Notifier;
use super::password::CredentialHasher;
use super::repository::{AccountKey, CredentialStore};
use super::reset::ResetTokenPolicy;
use super::token::{SessionClaims, TokenSigner};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub reset_policy: ResetTokenPolicy,
    /// Upper bound for a single notifier call.
    pub notify_timeout: Duration,
    /// Surface the raw reset token in the response when the reset email
    /// cannot be delivered. Anyone who can call forgot-password for an
    /// address then receives that account's token.
    pub expose_token_on_delivery_failure: bool,
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reset_policy: ResetTokenPolicy::default(),
            notify_timeout: Duration::from_secs(10),
            expose_token_on_delivery_failure: false,
            min_password_len: 1,
        }
    }
}

/// Account lifecycle engine: registration, login, password reset and
/// administrative state changes. Independent of any web framework.
///
/// Role checks for the administrative operations belong to the caller.
pub struct AuthService<R: CredentialStore + ?Sized> {
    repo: Arc<R>,
    hasher: Arc<dyn CredentialHasher>,
    signer: TokenSigner,
    notifier: Arc<dyn Notifier>,
    cfg: AuthConfig,
}

impl<R: CredentialStore + ?Sized> AuthService<R> {
    pub fn new(
        repo: Arc<R>,
        hasher: Arc<dyn CredentialHasher>,
        signer: TokenSigner,
        notifier: Arc<dyn Notifier>,
        cfg: AuthConfig,
    ) -> Self {
        Self { repo, hasher, signer, notifier, cfg }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Register a new active account and issue a session token.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, AuthConfig, TokenSigner, Argon2Hasher};
    /// use service::auth::domain::RegisterInput;
    /// use service::auth::repository::mock::InMemoryCredentialStore;
    /// use service::auth::notifier::mock::RecordingNotifier;
    ///
    /// let signer = TokenSigner::new("doc-secret", chrono::Duration::hours(1)).unwrap();
    /// let svc = AuthService::new(
    ///     Arc::new(InMemoryCredentialStore::new()),
    ///     Arc::new(Argon2Hasher::default()),
    ///     signer,
    ///     Arc::new(RecordingNotifier::new()),
    ///     AuthConfig::default(),
    /// );
    /// let input = RegisterInput {
    ///     username: "alice".into(), email: "a@x.com".into(), password: "pw1".into(),
    ///     full_name: "Alice A".into(), role: None,
    /// };
    /// let res = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert!(res.success);
    /// assert_eq!(res.user.unwrap().role.as_str(), "EMPLOYEE");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username, email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthResult, AuthError> {
        account::validate_username(&input.username)?;
        account::validate_email(&input.email)?;
        self.check_password(&input.password)?;

        if self.repo.exists_by_username(&input.username).await? {
            debug!("username taken");
            return Err(AuthError::UsernameTaken);
        }
        if self.repo.exists_by_email(&input.email).await? {
            debug!("email taken");
            return Err(AuthError::EmailTaken);
        }

        let hash = self.hasher.hash(&input.password)?;
        let role = input.role.unwrap_or_default();
        let saved = self
            .repo
            .save(Account::new(&input.username, &input.email, &input.full_name, hash, role))
            .await?;
        info!(user_id = %saved.id, role = %saved.role, "user_registered");

        let welcome = self.notifier.send_welcome_email(&saved.email, &saved.full_name, &saved.username);
        if let Err(e) = self.bounded(welcome).await {
            warn!(user_id = %saved.id, error = %e, "welcome email failed; registration kept");
        }

        let token = self.signer.issue(&saved.username, saved.role)?;
        Ok(AuthResult::session("User registered successfully!", token, saved.view()))
    }

    /// Verify credentials, stamp the login time and issue a session token.
    ///
    /// The stamp is applied only if the account is still active and its
    /// credential unchanged; it never writes back other fields.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthResult, AuthError> {
        let account = self
            .repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.active {
            debug!(user_id = %account.id, "login on deactivated account");
            return Err(AuthError::Deactivated);
        }
        if !self.hasher.verify(&input.password, &account.password_hash) {
            debug!(user_id = %account.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let verified_hash = account.password_hash.clone();
        let account = self
            .repo
            .update_account(
                AccountKey::Id(account.id),
                Box::new(move |current: &mut Account| {
                    if !current.active {
                        return Err(AuthError::Deactivated);
                    }
                    if current.password_hash != verified_hash {
                        return Err(AuthError::InvalidCredentials);
                    }
                    current.last_login = Some(Utc::now());
                    Ok(())
                }),
            )
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let token = self.signer.issue(&account.username, account.role)?;
        info!(user_id = %account.id, "user_logged_in");
        Ok(AuthResult::session("Login successful!", token, account.view()))
    }

    /// Issue (or re-issue) a reset token and try to mail it.
    ///
    /// A failed delivery still reports success; whether the token itself
    /// goes back to the caller is governed by
    /// [`AuthConfig::expose_token_on_delivery_failure`].
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<AuthResult, AuthError> {
        let pending = self.cfg.reset_policy.issue(Utc::now());
        let token = pending.token.clone();
        let account = self
            .repo
            .update_account(
                AccountKey::Email(&input.email),
                Box::new(move |current: &mut Account| -> Result<(), AuthError> {
                    current.reset = Some(pending);
                    Ok(())
                }),
            )
            .await?
            .ok_or(AuthError::EmailNotFound)?;
        info!(user_id = %account.id, "reset_token_issued");

        let send = self.notifier.send_password_reset_email(&account.email, &token, &account.full_name);
        match self.bounded(send).await {
            Ok(()) => Ok(AuthResult::ok("Password reset email sent! Please check your inbox.")),
            Err(e) => {
                warn!(user_id = %account.id, error = %e, "reset email failed");
                if self.cfg.expose_token_on_delivery_failure {
                    warn!(user_id = %account.id, "returning reset token in response");
                    Ok(AuthResult::ok(format!(
                        "Email sending failed. Reset token: {} (Valid for {})",
                        token,
                        self.cfg.reset_policy.describe_ttl()
                    )))
                } else {
                    Ok(AuthResult::ok(
                        "Password reset requested, but the email could not be delivered. Contact administrator.",
                    ))
                }
            }
        }
    }

    /// Consume a pending reset token and replace the password.
    ///
    /// The token is checked again against the stored record inside the
    /// update, so it is honoured at most once.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<AuthResult, AuthError> {
        let account = self.repo.find_by_email(&input.email).await?.ok_or(AuthError::EmailNotFound)?;

        let policy = &self.cfg.reset_policy;
        policy.verify(account.reset.as_ref(), &input.reset_token, Utc::now())?;
        self.check_password(&input.new_password)?;

        let new_hash = self.hasher.hash(&input.new_password)?;
        let presented = input.reset_token.as_str();
        let account = self
            .repo
            .update_account(
                AccountKey::Id(account.id),
                Box::new(move |current: &mut Account| -> Result<(), AuthError> {
                    policy.verify(current.reset.as_ref(), presented, Utc::now())?;
                    current.password_hash = new_hash;
                    current.reset = None;
                    Ok(())
                }),
            )
            .await?
            .ok_or(AuthError::EmailNotFound)?;
        info!(user_id = %account.id, "password_reset");
        Ok(AuthResult::ok("Password reset successful!"))
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountView>, AuthError> {
        let all = self.repo.find_all().await?;
        Ok(all.iter().map(AccountView::from).collect())
    }

    pub async fn get_account(&self, id: Uuid) -> Result<AccountView, AuthError> {
        self.repo.find_by_id(id).await?.map(|a| a.view()).ok_or(AuthError::AccountNotFound)
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: Uuid) -> Result<AuthResult, AuthError> {
        if !self.repo.exists_by_id(id).await? {
            return Err(AuthError::AccountNotFound);
        }
        self.repo.delete_by_id(id).await?;
        info!(user_id = %id, "user_deleted");
        Ok(AuthResult::ok("User deleted successfully!"))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_account(&self, id: Uuid) -> Result<AuthResult, AuthError> {
        self.repo
            .update_account(
                AccountKey::Id(id),
                Box::new(|current: &mut Account| -> Result<(), AuthError> {
                    current.active = false;
                    Ok(())
                }),
            )
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        info!(user_id = %id, "user_deactivated");
        Ok(AuthResult::ok("User deactivated successfully!"))
    }

    /// Check a presented session token. Reflects the role at issuance.
    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.signer.validate(token)
    }

    fn check_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.cfg.min_password_len.max(1) {
            return Err(AuthError::Validation(format!(
                "password too short (>={})",
                self.cfg.min_password_len.max(1)
            )));
        }
        Ok(())
    }

    async fn bounded<F>(&self, send: F) -> Result<(), AuthError>
    where
        F: Future<Output = Result<(), AuthError>>,
    {
        match tokio::time::timeout(self.cfg.notify_timeout, send).await {
            Ok(res) => res,
            Err(_) => Err(AuthError::Delivery(format!("timed out after {:?}", self.cfg.notify_timeout))),
        }
    }
}
