//! Reset-token policy: issuance and the single-use consumption rule.

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

use models::PendingReset;

use super::errors::AuthError;

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct ResetTokenPolicy {
    ttl: Duration,
}

impl Default for ResetTokenPolicy {
    fn default() -> Self {
        Self { ttl: Duration::hours(1) }
    }
}

impl ResetTokenPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh random token expiring one horizon after `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> PendingReset {
        let token: String = OsRng.sample_iter(&Alphanumeric).take(TOKEN_LEN).map(char::from).collect();
        PendingReset { token, expires_at: now + self.ttl }
    }

    /// Accept iff `presented` equals the pending token and `now` is strictly before expiry.
    /// Pure check; the caller clears the reset on success.
    pub fn verify(&self, pending: Option<&PendingReset>, presented: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let pending = match pending {
            Some(p) if p.token == presented => p,
            _ => return Err(AuthError::InvalidResetToken),
        };
        if now >= pending.expires_at {
            return Err(AuthError::ResetTokenExpired);
        }
        Ok(())
    }

    /// Human wording of the horizon, e.g. "1 hour" or "30 minutes".
    pub fn describe_ttl(&self) -> String {
        let minutes = self.ttl.num_minutes();
        if minutes > 0 && minutes % 60 == 0 {
            let hours = minutes / 60;
            if hours == 1 { "1 hour".to_string() } else { format!("{hours} hours") }
        } else if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_are_long_and_distinct() {
        let policy = ResetTokenPolicy::default();
        let now = Utc::now();
        let a = policy.issue(now);
        let b = policy.issue(now);
        assert_eq!(a.token.len(), TOKEN_LEN);
        assert!(a.token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a.token, b.token);
        assert_eq!(a.expires_at, now + Duration::hours(1));
    }

    #[test]
    fn matching_token_before_expiry_accepted() {
        let policy = ResetTokenPolicy::default();
        let now = Utc::now();
        let pending = policy.issue(now);
        assert!(policy.verify(Some(&pending), &pending.token, now + Duration::minutes(59)).is_ok());
    }

    #[test]
    fn mismatch_is_invalid_even_when_expired() {
        let policy = ResetTokenPolicy::default();
        let now = Utc::now();
        let pending = policy.issue(now);
        let later = now + Duration::hours(2);
        assert!(matches!(policy.verify(Some(&pending), "wrong", later), Err(AuthError::InvalidResetToken)));
    }

    #[test]
    fn no_pending_reset_is_invalid() {
        let policy = ResetTokenPolicy::default();
        assert!(matches!(policy.verify(None, "anything", Utc::now()), Err(AuthError::InvalidResetToken)));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let policy = ResetTokenPolicy::default();
        let now = Utc::now();
        let pending = policy.issue(now);
        let at_expiry = pending.expires_at;
        assert!(matches!(policy.verify(Some(&pending), &pending.token, at_expiry), Err(AuthError::ResetTokenExpired)));
        let just_before = at_expiry - Duration::milliseconds(1);
        assert!(policy.verify(Some(&pending), &pending.token, just_before).is_ok());
    }

    #[test]
    fn ttl_wording() {
        assert_eq!(ResetTokenPolicy::default().describe_ttl(), "1 hour");
        assert_eq!(ResetTokenPolicy::new(Duration::minutes(120)).describe_ttl(), "2 hours");
        assert_eq!(ResetTokenPolicy::new(Duration::minutes(30)).describe_ttl(), "30 minutes");
    }
}
