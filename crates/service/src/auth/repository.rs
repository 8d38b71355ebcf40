use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use models::Account;

use super::errors::AuthError;

/// Lookup key for [`CredentialStore::update_account`].
#[derive(Debug, Clone, Copy)]
pub enum AccountKey<'a> {
    Id(Uuid),
    Username(&'a str),
    Email(&'a str),
}

impl AccountKey<'_> {
    pub(crate) fn locate<'m>(&self, accounts: &'m HashMap<Uuid, Account>) -> Option<&'m Account> {
        match *self {
            AccountKey::Id(id) => accounts.get(&id),
            AccountKey::Username(username) => accounts.values().find(|a| a.username == username),
            AccountKey::Email(email) => accounts.values().find(|a| a.email == email),
        }
    }
}

/// Check-and-mutate step run by [`CredentialStore::update_account`].
/// Returning an error aborts the update with nothing written.
pub type AccountUpdate<'a> = Box<dyn FnOnce(&mut Account) -> Result<(), AuthError> + Send + 'a>;

/// Durable record of accounts.
///
/// Each call is atomic on its own; `save` is an upsert keyed by `Account::id`
/// and must refuse a username or email that belongs to another account.
/// Read-modify-write on an existing account goes through `update_account`,
/// which runs the closure against the current record under the store's
/// write lock.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError>;
    async fn exists_by_id(&self, id: Uuid) -> Result<bool, AuthError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError>;
    async fn find_all(&self) -> Result<Vec<Account>, AuthError>;

    async fn save(&self, account: Account) -> Result<Account, AuthError>;
    /// `Ok(None)` when no account matches `key`. The closure must not change the id.
    async fn update_account(&self, key: AccountKey<'_>, apply: AccountUpdate<'_>) -> Result<Option<Account>, AuthError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<(), AuthError>;
}

/// Uniqueness check shared by the bundled stores. Matching is exact.
pub(crate) fn ensure_unique(accounts: &HashMap<Uuid, Account>, candidate: &Account) -> Result<(), AuthError> {
    for other in accounts.values().filter(|a| a.id != candidate.id) {
        if other.username == candidate.username {
            return Err(AuthError::UsernameTaken);
        }
        if other.email == candidate.email {
            return Err(AuthError::EmailTaken);
        }
    }
    Ok(())
}

/// Ordering used by `find_all`: oldest first, id as tie-breaker.
pub(crate) fn sorted(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    accounts
}

/// Simple in-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryCredentialStore {
        accounts: RwLock<HashMap<Uuid, Account>>,
    }

    impl InMemoryCredentialStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.accounts.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.accounts.read().await.is_empty()
        }
    }

    #[async_trait]
    impl CredentialStore for InMemoryCredentialStore {
        async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
            Ok(self.accounts.read().await.values().any(|a| a.username == username))
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
            Ok(self.accounts.read().await.values().any(|a| a.email == email))
        }

        async fn exists_by_id(&self, id: Uuid) -> Result<bool, AuthError> {
            Ok(self.accounts.read().await.contains_key(&id))
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
            Ok(self.accounts.read().await.values().find(|a| a.username == username).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
            Ok(self.accounts.read().await.values().find(|a| a.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
            Ok(self.accounts.read().await.get(&id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Account>, AuthError> {
            Ok(sorted(self.accounts.read().await.values().cloned().collect()))
        }

        async fn save(&self, account: Account) -> Result<Account, AuthError> {
            let mut accounts = self.accounts.write().await;
            ensure_unique(&accounts, &account)?;
            accounts.insert(account.id, account.clone());
            Ok(account)
        }

        async fn update_account(
            &self,
            key: AccountKey<'_>,
            apply: AccountUpdate<'_>,
        ) -> Result<Option<Account>, AuthError> {
            let mut accounts = self.accounts.write().await;
            let Some(mut account) = key.locate(&accounts).cloned() else {
                return Ok(None);
            };
            apply(&mut account)?;
            ensure_unique(&accounts, &account)?;
            accounts.insert(account.id, account.clone());
            Ok(Some(account))
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<(), AuthError> {
            self.accounts.write().await.remove(&id);
            Ok(())
        }
    }
}
