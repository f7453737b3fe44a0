//! API handlers for the Lost & Found REST endpoints

pub mod auth;
pub mod dashboard;
pub mod declarations;
pub mod health;
pub mod items;
pub mod messages;
pub mod openapi;
pub mod restitutions;
pub mod stations;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

/// Like [`AuthenticatedUser`], for endpoints that also accept anonymous calls
pub struct OptionalUser(pub Option<UserClaims>);

/// Claims of the bearer token, `None` when no Authorization header is sent
fn bearer_claims(parts: &Parts, secret: &str) -> Result<Option<UserClaims>, AppError> {
    let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

    UserClaims::from_token(token, secret)
        .map(Some)
        .map_err(|e| AppError::Authentication(e.to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, &state.config.auth.jwt_secret)?
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(bearer_claims(parts, &state.config.auth.jwt_secret)?))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        // Public
        .route("/public/recent", get(items::recent_items))
        .route("/contact", post(messages::submit_contact))
        // Items
        .route("/items", get(items::list_items))
        .route("/items/:id", get(items::get_item))
        .route("/items/:id", delete(items::delete_item))
        // Declarations
        .route("/declarations", post(declarations::create_declaration))
        .route("/declarations/lost", get(declarations::list_lost))
        .route("/declarations/found", get(declarations::list_found))
        .route("/declarations/mine", get(declarations::list_mine))
        .route("/declarations/claimed", get(declarations::list_claimed))
        .route("/declarations/:id", get(declarations::get_declaration))
        .route("/declarations/:id", put(declarations::update_declaration))
        .route("/declarations/:id", delete(declarations::delete_declaration))
        .route("/declarations/:id/found", post(declarations::report_found))
        .route("/declarations/:id/claim", post(declarations::claim))
        .route("/declarations/:id/restitution", post(restitutions::schedule))
        // Restitutions
        .route("/restitutions", get(restitutions::list_restitutions))
        .route("/restitutions/mine", get(restitutions::list_mine))
        .route("/restitutions/:id", get(restitutions::get_restitution))
        .route("/restitutions/:id", delete(restitutions::delete_restitution))
        .route("/restitutions/:id/complete", post(restitutions::complete))
        .route("/restitutions/:id/cancel", post(restitutions::cancel))
        .route("/restitutions/:id/reopen", post(restitutions::reopen))
        .route("/restitutions/:id/proof", get(restitutions::download_proof))
        .route("/restitutions/:id/verify", get(restitutions::verify))
        // Police stations
        .route("/stations", get(stations::list_stations))
        .route("/stations", post(stations::create_station))
        .route("/stations/:id", put(stations::update_station))
        .route("/stations/:id", delete(stations::delete_station))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/officers", post(users::create_officer))
        .route("/users/admins", post(users::create_admin))
        .route("/users/:id", put(users::update_user))
        .route("/users/:id", delete(users::delete_user))
        .route("/users/:id/ban", post(users::ban_user))
        .route("/users/:id/unban", post(users::unban_user))
        // Messages and notifications
        .route("/messages", get(messages::list_messages))
        .route("/messages/:id/reply", post(messages::reply_message))
        .route("/notifications", get(messages::list_notifications))
        .route("/notifications/:id/read", post(messages::mark_notification_read))
        // Dashboards
        .route("/dashboard/admin", get(dashboard::admin_dashboard))
        .route("/dashboard/officer", get(dashboard::officer_dashboard))
        .route("/dashboard/citizen", get(dashboard::citizen_dashboard))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
