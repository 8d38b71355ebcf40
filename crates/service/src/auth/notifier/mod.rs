//! Outbound notifications (welcome and password-reset mail).
//!
//! Delivery is best-effort from the engine's point of view: it bounds every
//! call with a timeout and decides per workflow what a failure means.

pub mod http;
pub mod log;
pub mod messages;

use async_trait::async_trait;

use super::errors::AuthError;

pub use self::http::HttpNotifier;
pub use self::log::LogNotifier;
pub use self::messages::{EmailMessage, MessageComposer};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_welcome_email(&self, to_email: &str, full_name: &str, username: &str) -> Result<(), AuthError>;
    async fn send_password_reset_email(&self, to_email: &str, reset_token: &str, full_name: &str) -> Result<(), AuthError>;
}

/// Recording notifier with switchable failures, for tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Welcome { to: String, username: String },
        Reset { to: String, token: String },
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Sent>>,
        fail_welcome: AtomicBool,
        fail_reset: AtomicBool,
        delay: Option<Duration>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every send sleeps this long first; pair with a short engine timeout.
        pub fn with_delay(delay: Duration) -> Self {
            Self { delay: Some(delay), ..Self::default() }
        }

        pub fn fail_welcome(&self, fail: bool) {
            self.fail_welcome.store(fail, Ordering::SeqCst);
        }

        pub fn fail_reset(&self, fail: bool) {
            self.fail_reset.store(fail, Ordering::SeqCst);
        }

        pub async fn sent(&self) -> Vec<Sent> {
            self.sent.lock().await.clone()
        }

        /// Token carried by the most recent reset message.
        pub async fn last_reset_token(&self) -> Option<String> {
            self.sent.lock().await.iter().rev().find_map(|s| match s {
                Sent::Reset { token, .. } => Some(token.clone()),
                Sent::Welcome { .. } => None,
            })
        }

        async fn pause(&self) {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_welcome_email(&self, to_email: &str, _full_name: &str, username: &str) -> Result<(), AuthError> {
            self.pause().await;
            if self.fail_welcome.load(Ordering::SeqCst) {
                return Err(AuthError::Delivery("welcome relay unavailable".into()));
            }
            self.sent.lock().await.push(Sent::Welcome { to: to_email.into(), username: username.into() });
            Ok(())
        }

        async fn send_password_reset_email(&self, to_email: &str, reset_token: &str, _full_name: &str) -> Result<(), AuthError> {
            self.pause().await;
            if self.fail_reset.load(Ordering::SeqCst) {
                return Err(AuthError::Delivery("reset relay unavailable".into()));
            }
            self.sent.lock().await.push(Sent::Reset { to: to_email.into(), token: reset_token.into() });
            Ok(())
        }
    }
}
