//! Auth module: account lifecycle engine and its collaborators.
//!
//! Layers follow the usual split: `domain` types, `repository` (storage
//! trait, with concrete stores under `repo`), and `service` (the engine).
//! Session signing, reset-token policy, hashing and notification are
//! separate capabilities injected into the engine.

pub mod domain;
pub mod errors;
pub mod notifier;
pub mod password;
pub mod repo;
pub mod repository;
pub mod reset;
pub mod service;
pub mod token;

pub use domain::{AuthResult, Operation};
pub use errors::{AuthError, ErrorKind};
pub use notifier::Notifier;
pub use password::{Argon2Hasher, CredentialHasher};
pub use repository::{AccountKey, AccountUpdate, CredentialStore};
pub use reset::ResetTokenPolicy;
pub use service::{AuthConfig, AuthService};
pub use token::{SessionClaims, TokenSigner};
