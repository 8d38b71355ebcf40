//! Account records and their public projection.
//!
//! Storage-agnostic: the service crate decides where accounts live.

pub mod account;
pub mod errors;

pub use account::{Account, AccountView, PendingReset, Role};
