use async_trait::async_trait;
use tracing::info;

use super::messages::{mask, MessageComposer};
use super::Notifier;
use crate::auth::errors::AuthError;

/// Renders messages and writes them to the log instead of sending them.
pub struct LogNotifier {
    composer: MessageComposer,
}

impl LogNotifier {
    pub fn new(composer: MessageComposer) -> Self {
        Self { composer }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_welcome_email(&self, to_email: &str, full_name: &str, username: &str) -> Result<(), AuthError> {
        let m = self.composer.welcome(to_email, full_name, username);
        info!(to = %m.to, subject = %m.subject, "welcome email (log only)");
        Ok(())
    }

    async fn send_password_reset_email(&self, to_email: &str, reset_token: &str, full_name: &str) -> Result<(), AuthError> {
        let m = self.composer.password_reset(to_email, reset_token, full_name);
        info!(to = %m.to, subject = %m.subject, token = %mask(reset_token), "password reset email (log only)");
        Ok(())
    }
}
