use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use serde::Serialize;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub version: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// `EMPLOYEE` (default) or `ADMIN`
    pub role: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct ForgotPasswordRequest { pub email: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest { pub email: String, pub reset_token: String, pub new_password: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountViewDoc {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(ToSchema)]
pub struct SessionClaimsDoc {
    pub subject: String,
    /// `EMPLOYEE` or `ADMIN`
    pub role: String,
    pub issued_at: String,
    pub expires_at: String,
}

#[derive(ToSchema)]
pub struct AuthResultDoc {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub user: Option<AccountViewDoc>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::admin::list_users,
        crate::routes::admin::get_user,
        crate::routes::admin::delete_user,
        crate::routes::admin::deactivate_user,
    ),
    components(
        schemas(
            HealthResponse,
            SignupRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            AccountViewDoc,
            SessionClaimsDoc,
            AuthResultDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "admin")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_account_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/auth/signup"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/auth/users/{id}/deactivate"));
    }

    #[test]
    fn document_covers_every_routed_auth_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/signup",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/forgot-password",
            "/api/auth/reset-password",
            "/api/auth/me",
            "/api/auth/users",
            "/api/auth/users/{id}",
            "/api/auth/users/{id}/deactivate",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from the document");
        }
    }
}
