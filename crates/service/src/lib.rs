//! Service layer for the account service.
//! - Owns the credential and token lifecycle rules.
//! - Talks to storage and mail only through traits.
//! - Returns tagged errors; flattening for callers happens in `AuthResult`.

pub mod auth;
