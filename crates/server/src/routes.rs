pub mod admin;
pub mod auth;

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use self::auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router: public auth endpoints, session-only
/// endpoints and the admin-gated account management endpoints.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password));

    let session = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    // layers run outside-in: bearer check first, then the role gate
    let admin_routes = Router::new()
        .route("/api/auth/users", get(admin::list_users))
        .route("/api/auth/users/:id", get(admin::get_user).delete(admin::delete_user))
        .route("/api/auth/users/:id/deactivate", put(admin::deactivate_user))
        .route_layer(middleware::from_fn(admin::require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    public
        .merge(session)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
