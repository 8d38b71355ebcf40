use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::messages::{EmailMessage, MessageComposer};
use super::Notifier;
use crate::auth::errors::AuthError;

/// Posts rendered messages as JSON to a mail relay.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
    composer: MessageComposer,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>, composer: MessageComposer, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Delivery(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), composer })
    }

    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn deliver(&self, message: EmailMessage) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| AuthError::Delivery(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Delivery(format!("relay answered {status}")));
        }
        debug!(%status, "mail relay accepted message");
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_welcome_email(&self, to_email: &str, full_name: &str, username: &str) -> Result<(), AuthError> {
        self.deliver(self.composer.welcome(to_email, full_name, username)).await
    }

    async fn send_password_reset_email(&self, to_email: &str, reset_token: &str, full_name: &str) -> Result<(), AuthError> {
        self.deliver(self.composer.password_reset(to_email, reset_token, full_name)).await
    }
}
