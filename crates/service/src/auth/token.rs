//! Signed session tokens (HS256 JWT) bound to a subject and a role.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use models::Role;

use super::errors::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: u64,
    exp: u64,
}

/// What a valid session token proves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionClaims {
    pub subject: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Stateless signer; holds only the key material and the token horizon.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Fails only when the secret is empty; callers treat that as fatal at startup.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::TokenError("signing secret is empty".into()));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `{subject, role, issuedAt, expiry}` with expiry one horizon from now.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp().max(0) as u64,
            exp: (now + self.ttl).timestamp().max(0) as u64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Verify signature and expiry. Anything short of a fully valid token is `InvalidSession`.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|_| AuthError::InvalidSession)?;
        let claims = data.claims;
        let issued_at = timestamp(claims.iat).ok_or(AuthError::InvalidSession)?;
        let expires_at = timestamp(claims.exp).ok_or(AuthError::InvalidSession)?;
        Ok(SessionClaims { subject: claims.sub, role: claims.role, issued_at, expires_at })
    }
}

fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("unit-test-secret", Duration::hours(1)).unwrap()
    }

    #[test]
    fn issued_token_validates_with_role() {
        let s = signer();
        let token = s.issue("alice", Role::Admin).unwrap();
        let claims = s.validate(&token).unwrap();
        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.expires_at > claims.issued_at);
    }

    #[test]
    fn expired_token_is_invalid() {
        let s = TokenSigner::new("unit-test-secret", Duration::seconds(-120)).unwrap();
        let token = s.issue("alice", Role::Employee).unwrap();
        assert!(matches!(s.validate(&token), Err(AuthError::InvalidSession)));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let s = signer();
        let token = s.issue("alice", Role::Employee).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        // swap the payload for one claiming a different role
        let forged = signer_with("other-secret").issue("alice", Role::Admin).unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        let tampered = parts.join(".");
        assert!(matches!(s.validate(&tampered), Err(AuthError::InvalidSession)));
    }

    #[test]
    fn foreign_key_is_rejected() {
        let token = signer_with("other-secret").issue("bob", Role::Employee).unwrap();
        assert!(signer().validate(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(signer().validate("not-a-jwt").is_err());
        assert!(signer().validate("").is_err());
    }

    #[test]
    fn empty_secret_refused() {
        assert!(TokenSigner::new("", Duration::hours(1)).is_err());
    }

    fn signer_with(secret: &str) -> TokenSigner {
        TokenSigner::new(secret, Duration::hours(1)).unwrap()
    }
}
