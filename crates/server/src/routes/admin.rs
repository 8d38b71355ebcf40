use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use models::{AccountView, Role};
use service::auth::{AuthError, AuthResult, Operation, SessionClaims};

use super::auth::ServerState;
use crate::errors::JsonApiError;

/// Middleware: only sessions carrying the ADMIN role pass.
/// Expects `require_bearer_token` to have run first.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, JsonApiError> {
    let Some(claims) = req.extensions().get::<SessionClaims>() else {
        return Err(JsonApiError::unauthorized("missing session token"));
    };
    if claims.role != Role::Admin {
        warn!(subject = %claims.subject, role = %claims.role, path = %req.uri().path(), "admin route refused");
        return Err(JsonApiError::forbidden());
    }
    Ok(next.run(req).await)
}

#[utoipa::path(get, path = "/api/auth/users", tag = "admin", security(("bearer" = [])), responses((status = 200, description = "All accounts", body = [crate::openapi::AccountViewDoc]), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden")))]
pub async fn list_users(State(state): State<ServerState>) -> Result<Json<Vec<AccountView>>, JsonApiError> {
    let users = state.auth.list_accounts().await.map_err(|e| {
        JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "List Failed", Some(Operation::ListAccounts.render(&e)))
    })?;
    info!(count = users.len(), "list users");
    Ok(Json(users))
}

#[utoipa::path(get, path = "/api/auth/users/{id}", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Account id")), responses((status = 200, description = "Account", body = crate::openapi::AccountViewDoc), (status = 404, description = "Not Found")))]
pub async fn get_user(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<AccountView>, JsonApiError> {
    match state.auth.get_account(id).await {
        Ok(view) => Ok(Json(view)),
        Err(AuthError::AccountNotFound) => Err(JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", None)),
        Err(e) => Err(JsonApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Lookup Failed",
            Some(Operation::GetAccount.render(&e)),
        )),
    }
}

#[utoipa::path(delete, path = "/api/auth/users/{id}", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Account id")), responses((status = 200, description = "Outcome in body", body = crate::openapi::AuthResultDoc)))]
pub async fn delete_user(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Json<AuthResult> {
    Json(AuthResult::from_outcome(Operation::DeleteAccount, state.auth.delete_account(id).await))
}

#[utoipa::path(put, path = "/api/auth/users/{id}/deactivate", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Account id")), responses((status = 200, description = "Outcome in body", body = crate::openapi::AuthResultDoc)))]
pub async fn deactivate_user(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Json<AuthResult> {
    Json(AuthResult::from_outcome(Operation::DeactivateAccount, state.auth.deactivate_account(id).await))
}
