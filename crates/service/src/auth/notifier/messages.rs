use serde::Serialize;

/// A rendered plain-text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Renders the welcome and reset messages.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    pub from: String,
    pub frontend_url: String,
    /// Wording of the reset-token horizon, e.g. "1 hour".
    pub reset_validity: String,
}

impl MessageComposer {
    pub fn welcome(&self, to: &str, full_name: &str, username: &str) -> EmailMessage {
        let text = format!(
            "Hello {full_name},\n\n\
             Your account has been created successfully.\n\n\
             Username: {username}\n\n\
             Sign in at {url} to get started.\n",
            url = self.frontend_url,
        );
        EmailMessage { from: self.from.clone(), to: to.to_string(), subject: "Welcome aboard!".into(), text }
    }

    pub fn password_reset(&self, to: &str, reset_token: &str, full_name: &str) -> EmailMessage {
        let text = format!(
            "Hello {full_name},\n\n\
             We received a request to reset your password.\n\n\
             Your reset token: {reset_token}\n\n\
             It expires in {validity}. Enter it together with your email and a new password at\n\
             {url}/reset-password\n\n\
             If you did not request this, ignore this message; your password stays unchanged.\n",
            validity = self.reset_validity,
            url = self.frontend_url.trim_end_matches('/'),
        );
        EmailMessage { from: self.from.clone(), to: to.to_string(), subject: "Password reset request".into(), text }
    }
}

/// Shortened token for log lines.
pub(crate) fn mask(token: &str) -> String {
    let head: String = token.chars().take(4).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> MessageComposer {
        MessageComposer {
            from: "no-reply@inventory.local".into(),
            frontend_url: "https://app.local/".into(),
            reset_validity: "1 hour".into(),
        }
    }

    #[test]
    fn reset_message_contains_token_and_horizon() {
        let m = composer().password_reset("a@x.com", "TOKEN123", "Alice A");
        assert_eq!(m.to, "a@x.com");
        assert!(m.text.contains("TOKEN123"));
        assert!(m.text.contains("1 hour"));
        assert!(m.text.contains("https://app.local/reset-password"));
        assert!(m.text.starts_with("Hello Alice A"));
    }

    #[test]
    fn welcome_message_names_user() {
        let m = composer().welcome("a@x.com", "Alice A", "alice");
        assert!(m.text.contains("Username: alice"));
        assert_eq!(m.from, "no-reply@inventory.local");
    }

    #[test]
    fn mask_keeps_prefix_only() {
        assert_eq!(mask("abcdefgh"), "abcd…");
        assert_eq!(mask("ab"), "ab…");
    }
}
