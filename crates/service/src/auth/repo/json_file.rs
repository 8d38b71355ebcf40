use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use models::Account;

use crate::auth::errors::AuthError;
use crate::auth::repository::{ensure_unique, sorted, AccountKey, AccountUpdate, CredentialStore};

/// Accounts persisted as one JSON document.
///
/// Writes hold the lock across the disk write, so mutations are serialised
/// and a crash leaves either the old or the new document (temp file + rename).
pub struct JsonFileCredentialStore {
    inner: RwLock<HashMap<Uuid, Account>>,
    file_path: PathBuf,
}

impl JsonFileCredentialStore {
    /// Open the store, creating an empty document if the file is missing.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, AuthError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(repo_err)?;
        }

        let accounts: HashMap<Uuid, Account> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                let list: Vec<Account> = serde_json::from_slice(&bytes).map_err(repo_err)?;
                list.into_iter().map(|a| (a.id, a)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = HashMap::new();
                write_document(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(repo_err(e)),
        };
        info!(path = %file_path.display(), accounts = accounts.len(), "account store opened");

        Ok(Arc::new(Self { inner: RwLock::new(accounts), file_path }))
    }

    async fn find_where<F>(&self, pred: F) -> Option<Account>
    where
        F: Fn(&Account) -> bool,
    {
        self.inner.read().await.values().find(|&a| pred(a)).cloned()
    }
}

async fn write_document(path: &PathBuf, accounts: &HashMap<Uuid, Account>) -> Result<(), AuthError> {
    let data = serde_json::to_vec_pretty(&sorted(accounts.values().cloned().collect())).map_err(repo_err)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).await.map_err(repo_err)?;
    fs::rename(&tmp, path).await.map_err(repo_err)?;
    debug!(path = %path.display(), accounts = accounts.len(), "account store persisted");
    Ok(())
}

fn repo_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Repository(e.to_string())
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.find_where(|a| a.username == username).await.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.find_where(|a| a.email == email).await.is_some())
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, AuthError> {
        Ok(self.inner.read().await.contains_key(&id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.find_where(|a| a.username == username).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.find_where(|a| a.email == email).await)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Account>, AuthError> {
        Ok(sorted(self.inner.read().await.values().cloned().collect()))
    }

    async fn save(&self, account: Account) -> Result<Account, AuthError> {
        let mut accounts = self.inner.write().await;
        ensure_unique(&accounts, &account)?;
        let previous = accounts.insert(account.id, account.clone());
        if let Err(e) = write_document(&self.file_path, &accounts).await {
            // keep memory and disk in agreement
            match previous {
                Some(prev) => accounts.insert(prev.id, prev),
                None => accounts.remove(&account.id),
            };
            return Err(e);
        }
        Ok(account)
    }

    async fn update_account(&self, key: AccountKey<'_>, apply: AccountUpdate<'_>) -> Result<Option<Account>, AuthError> {
        let mut accounts = self.inner.write().await;
        let Some(mut account) = key.locate(&accounts).cloned() else {
            return Ok(None);
        };
        apply(&mut account)?;
        ensure_unique(&accounts, &account)?;
        let previous = accounts.insert(account.id, account.clone());
        if let Err(e) = write_document(&self.file_path, &accounts).await {
            if let Some(prev) = previous {
                accounts.insert(prev.id, prev);
            }
            return Err(e);
        }
        Ok(Some(account))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AuthError> {
        let mut accounts = self.inner.write().await;
        let Some(removed) = accounts.remove(&id) else {
            return Ok(());
        };
        if let Err(e) = write_document(&self.file_path, &accounts).await {
            accounts.insert(removed.id, removed);
            return Err(e);
        }
        Ok(())
    }
}
