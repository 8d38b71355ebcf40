use std::sync::Arc;

use argon2::Params;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::Service;

use service::auth::notifier::mock::RecordingNotifier;
use service::auth::repository::mock::InMemoryCredentialStore;
use service::auth::{Argon2Hasher, AuthConfig, AuthService, CredentialStore, TokenSigner};

use server::routes::{self, auth::ServerState};

struct TestApp {
    app: Router,
    notifier: Arc<RecordingNotifier>,
}

fn cors() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::very_permissive()
}

fn build_app() -> TestApp {
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let hasher = Argon2Hasher::new(Params::new(1024, 1, 1, None).expect("params"));
    let signer = TokenSigner::new("http-test-secret", chrono::Duration::hours(1)).expect("signer");
    let svc = AuthService::new(store, Arc::new(hasher), signer, notifier.clone(), AuthConfig::default());
    let app = routes::build_router(ServerState::new(Arc::new(svc)), cors());
    TestApp { app, notifier }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, headers, value))
}

async fn signup(app: &Router, username: &str, email: &str, password: &str, role: Option<&str>) -> anyhow::Result<Value> {
    let mut body = json!({"username": username, "email": email, "password": password, "fullName": "Test User"});
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, _, value) = send(app, "POST", "/api/auth/signup", Some(body), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(value)
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let t = build_app();
    let (status, _, body) = send(&t.app, "GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn signup_login_and_me() -> anyhow::Result<()> {
    let t = build_app();
    let body = signup(&t.app, "alice", "a@x.com", "pw1", None).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User registered successfully!");
    assert_eq!(body["user"]["role"], "EMPLOYEE");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, headers, body) = send(
        &t.app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "alice", "password": "pw1"})),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful!");
    let cookie = headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let token = body["token"].as_str().expect("token").to_string();
    let (status, _, me) = send(&t.app, "GET", "/api/auth/me", None, Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["subject"], "alice");
    assert_eq!(me["role"], "EMPLOYEE");
    Ok(())
}

#[tokio::test]
async fn business_failures_are_flat_results() -> anyhow::Result<()> {
    let t = build_app();
    signup(&t.app, "alice", "a@x.com", "pw1", None).await?;
    let dup = signup(&t.app, "alice", "b@x.com", "pw2", None).await?;
    assert_eq!(dup["success"], false);
    assert_eq!(dup["message"], "Username already exists!");
    assert!(dup.get("token").is_none());

    let (status, headers, body) = send(
        &t.app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "alice", "password": "bad"})),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid username or password!");
    assert!(headers.get(header::SET_COOKIE).is_none());
    Ok(())
}

#[tokio::test]
async fn session_routes_need_a_valid_token() -> anyhow::Result<()> {
    let t = build_app();
    let (status, _, _) = send(&t.app, "GET", "/api/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = send(&t.app, "GET", "/api/auth/me", None, Some("garbage")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenSigner::new("someone-else", chrono::Duration::hours(1))?.issue("alice", models::Role::Admin)?;
    let (status, _, _) = send(&t.app, "GET", "/api/auth/users", None, Some(&foreign)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_routes_are_role_gated() -> anyhow::Result<()> {
    let t = build_app();
    let employee = signup(&t.app, "alice", "a@x.com", "pw1", None).await?;
    let admin = signup(&t.app, "root", "root@x.com", "pw", Some("ADMIN")).await?;
    let employee_token = employee["token"].as_str().expect("token").to_string();
    let admin_token = admin["token"].as_str().expect("token").to_string();
    let alice_id = employee["user"]["id"].as_str().expect("id").to_string();

    let (status, _, body) = send(&t.app, "GET", "/api/auth/users", None, Some(&employee_token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _, body) = send(&t.app, "GET", "/api/auth/users", None, Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (status, _, body) = send(&t.app, "GET", &format!("/api/auth/users/{alice_id}"), None, Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let missing = uuid::Uuid::new_v4();
    let (status, _, _) = send(&t.app, "GET", &format!("/api/auth/users/{missing}"), None, Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) =
        send(&t.app, "PUT", &format!("/api/auth/users/{alice_id}/deactivate"), None, Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deactivated successfully!");

    let (_, _, body) = send(
        &t.app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "alice", "password": "pw1"})),
        None,
    )
    .await?;
    assert_eq!(body["message"], "Account is deactivated. Contact administrator.");

    let (_, _, body) = send(&t.app, "DELETE", &format!("/api/auth/users/{alice_id}"), None, Some(&admin_token)).await?;
    assert_eq!(body["message"], "User deleted successfully!");
    let (_, _, body) = send(&t.app, "DELETE", &format!("/api/auth/users/{alice_id}"), None, Some(&admin_token)).await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User not found!");
    Ok(())
}

#[tokio::test]
async fn password_reset_over_http() -> anyhow::Result<()> {
    let t = build_app();
    signup(&t.app, "alice", "a@x.com", "pw1", None).await?;

    let (_, _, body) = send(&t.app, "POST", "/api/auth/forgot-password", Some(json!({"email": "nobody@x.com"})), None).await?;
    assert_eq!(body["message"], "Email not found!");

    let (_, _, body) = send(&t.app, "POST", "/api/auth/forgot-password", Some(json!({"email": "a@x.com"})), None).await?;
    assert_eq!(body["success"], true);
    let token = t.notifier.last_reset_token().await.expect("reset mail");

    let (_, _, body) = send(
        &t.app,
        "POST",
        "/api/auth/reset-password",
        Some(json!({"email": "a@x.com", "resetToken": "nope", "newPassword": "pw3"})),
        None,
    )
    .await?;
    assert_eq!(body["message"], "Invalid reset token!");

    let (_, _, body) = send(
        &t.app,
        "POST",
        "/api/auth/reset-password",
        Some(json!({"email": "a@x.com", "resetToken": token, "newPassword": "pw3"})),
        None,
    )
    .await?;
    assert_eq!(body["message"], "Password reset successful!");

    let (_, _, body) = send(
        &t.app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "alice", "password": "pw3"})),
        None,
    )
    .await?;
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let t = build_app();
    let (status, _, body) = send(&t.app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/auth/login").is_some());
    Ok(())
}
