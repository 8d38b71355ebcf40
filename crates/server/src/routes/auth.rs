use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use service::auth::domain::{ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput};
use service::auth::{AuthResult, AuthService, CredentialStore, Operation, SessionClaims};

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

pub type DynAuthService = AuthService<dyn CredentialStore>;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<DynAuthService>,
}

impl ServerState {
    pub fn new(auth: Arc<DynAuthService>) -> Self {
        Self { auth }
    }
}

#[utoipa::path(post, path = "/api/auth/signup", tag = "auth", request_body = crate::openapi::SignupRequest, responses((status = 200, description = "Outcome in body", body = crate::openapi::AuthResultDoc)))]
pub async fn signup(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Json<AuthResult> {
    Json(AuthResult::from_outcome(Operation::Register, state.auth.register(input).await))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Outcome in body; sets auth_token cookie on success", body = crate::openapi::AuthResultDoc)))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> (CookieJar, Json<AuthResult>) {
    let result = AuthResult::from_outcome(Operation::Login, state.auth.login(input).await);
    let jar = match &result.token {
        Some(token) => {
            let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookie.set_same_site(SameSite::Lax);
            jar.add(cookie)
        }
        None => jar,
    };
    (jar, Json(result))
}

/// Drops the session cookie. Already-issued tokens stay valid until expiry.
#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 204, description = "auth_token cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/auth/forgot-password", tag = "auth", request_body = crate::openapi::ForgotPasswordRequest, responses((status = 200, description = "Outcome in body", body = crate::openapi::AuthResultDoc)))]
pub async fn forgot_password(State(state): State<ServerState>, Json(input): Json<ForgotPasswordInput>) -> Json<AuthResult> {
    Json(AuthResult::from_outcome(Operation::ForgotPassword, state.auth.forgot_password(input).await))
}

#[utoipa::path(post, path = "/api/auth/reset-password", tag = "auth", request_body = crate::openapi::ResetPasswordRequest, responses((status = 200, description = "Outcome in body", body = crate::openapi::AuthResultDoc)))]
pub async fn reset_password(State(state): State<ServerState>, Json(input): Json<ResetPasswordInput>) -> Json<AuthResult> {
    Json(AuthResult::from_outcome(Operation::ResetPassword, state.auth.reset_password(input).await))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", security(("bearer" = [])), responses((status = 200, description = "Claims of the presented session", body = crate::openapi::SessionClaimsDoc), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(claims): Extension<SessionClaims>) -> Json<SessionClaims> {
    Json(claims)
}

/// Middleware: require a valid session token from `Authorization: Bearer`
/// or the `auth_token` cookie. Valid claims go into request extensions.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let authz = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());

    let token = match authz {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) => t.trim().to_string(),
            None => {
                warn!(%path, "invalid Authorization format (expect Bearer)");
                return Err(JsonApiError::unauthorized("expected a Bearer token"));
            }
        },
        None => match jar.get(AUTH_COOKIE).map(|c| c.value().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => {
                warn!(%path, "missing Authorization header and auth_token cookie");
                return Err(JsonApiError::unauthorized("missing session token"));
            }
        },
    };

    let claims = state.auth.validate_session(&token).map_err(|e| {
        warn!(%path, error = %e, "session token rejected");
        JsonApiError::unauthorized("invalid or expired session token")
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
