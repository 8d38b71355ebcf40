use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Session and reset-token policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,
    /// Put the raw reset token into the response when the reset email fails.
    #[serde(default)]
    pub expose_token_on_delivery_failure: bool,
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_ttl_hours: default_session_ttl_hours(),
            reset_token_ttl_minutes: default_reset_token_ttl_minutes(),
            notify_timeout_secs: default_notify_timeout_secs(),
            expose_token_on_delivery_failure: false,
            min_password_len: default_min_password_len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub kind: NotifierKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self { kind: NotifierKind::Log, endpoint: None, from: default_from(), frontend_url: default_frontend_url() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_accounts_path")]
    pub accounts_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { accounts_path: default_accounts_path() }
    }
}

fn default_session_ttl_hours() -> i64 { 24 }
fn default_reset_token_ttl_minutes() -> i64 { 60 }
fn default_notify_timeout_secs() -> u64 { 10 }
fn default_min_password_len() -> usize { 1 }
fn default_from() -> String { "no-reply@localhost".into() }
fn default_frontend_url() -> String { "http://localhost:8080".into() }
fn default_accounts_path() -> String { "data/accounts.json".into() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Defaults only when the file does not exist; unreadable or malformed
/// files are errors.
pub fn load_from_file_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).with_context(|| format!("invalid config file {path}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow::Error::new(e).context(format!("cannot read config file {path}"))),
    }
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`], but a missing config file falls
    /// back to defaults plus environment variables.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = load_from_file_or_default(path)?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.notifier.validate()?;
        if self.storage.accounts_path.trim().is_empty() {
            self.storage.accounts_path = default_accounts_path();
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or the JWT_SECRET env var"));
        }
        if self.session_ttl_hours <= 0 {
            return Err(anyhow!("auth.session_ttl_hours must be positive"));
        }
        if self.reset_token_ttl_minutes <= 0 {
            return Err(anyhow!("auth.reset_token_ttl_minutes must be positive"));
        }
        if self.notify_timeout_secs == 0 {
            return Err(anyhow!("auth.notify_timeout_secs must be positive"));
        }
        Ok(())
    }
}

impl NotifierSettings {
    pub fn validate(&self) -> Result<()> {
        if self.kind == NotifierKind::Http {
            let endpoint = self.endpoint.as_deref().unwrap_or("").trim().to_lowercase();
            if endpoint.is_empty() {
                return Err(anyhow!("notifier.endpoint is required when notifier.kind = \"http\""));
            }
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(anyhow!("notifier.endpoint must start with http:// or https://"));
            }
        }
        Ok(())
    }
}
