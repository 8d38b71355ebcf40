use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::{AppConfig, NotifierKind};
use service::auth::notifier::{HttpNotifier, LogNotifier, MessageComposer};
use service::auth::repo::json_file::JsonFileCredentialStore;
use service::auth::{
    Argon2Hasher, AuthConfig, AuthService, CredentialStore, Notifier, ResetTokenPolicy, TokenSigner,
};

use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    addr.parse().with_context(|| format!("invalid bind address {addr}"))
}

/// Wire store, signer, notifier and engine from configuration.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let store: Arc<dyn CredentialStore> = JsonFileCredentialStore::open(&cfg.storage.accounts_path).await?;

    // an unusable signing key stops the process here
    let signer = TokenSigner::new(&cfg.auth.jwt_secret, chrono::Duration::hours(cfg.auth.session_ttl_hours))?;

    let reset_policy = ResetTokenPolicy::new(chrono::Duration::minutes(cfg.auth.reset_token_ttl_minutes));
    let notify_timeout = Duration::from_secs(cfg.auth.notify_timeout_secs);
    let composer = MessageComposer {
        from: cfg.notifier.from.clone(),
        frontend_url: cfg.notifier.frontend_url.clone(),
        reset_validity: reset_policy.describe_ttl(),
    };
    let notifier: Arc<dyn Notifier> = match (cfg.notifier.kind, cfg.notifier.endpoint.as_deref()) {
        (NotifierKind::Http, Some(endpoint)) => Arc::new(HttpNotifier::new(endpoint, composer, notify_timeout)?),
        _ => Arc::new(LogNotifier::new(composer)),
    };

    let auth_cfg = AuthConfig {
        reset_policy,
        notify_timeout,
        expose_token_on_delivery_failure: cfg.auth.expose_token_on_delivery_failure,
        min_password_len: cfg.auth.min_password_len,
    };
    let svc = AuthService::new(store, Arc::new(Argon2Hasher::default()), signer, notifier, auth_cfg);
    info!(
        notifier = ?cfg.notifier.kind,
        expose_token_on_delivery_failure = cfg.auth.expose_token_on_delivery_failure,
        "auth service ready"
    );
    Ok(ServerState::new(Arc::new(svc)))
}

/// Build the application router from configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app from an already validated configuration and
/// run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting account service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_config() -> (AppConfig, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("account_service_{}", uuid::Uuid::new_v4()));
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "startup-test-secret".into();
        cfg.storage.accounts_path = dir.join("nested").join("accounts.json").to_string_lossy().into_owned();
        (cfg, dir)
    }

    #[tokio::test]
    async fn build_state_creates_the_store_directory() -> anyhow::Result<()> {
        let (cfg, dir) = scratch_config();
        let state = build_state(&cfg).await?;
        assert!(std::path::Path::new(&cfg.storage.accounts_path).exists());
        assert!(state.auth.list_accounts().await?.is_empty());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[test]
    fn bind_address_comes_from_the_given_config() -> anyhow::Result<()> {
        let (mut cfg, _) = scratch_config();
        cfg.server.host = "0.0.0.0".into();
        cfg.server.port = 9123;
        assert_eq!(bind_addr(&cfg)?.to_string(), "0.0.0.0:9123");
        Ok(())
    }
}
