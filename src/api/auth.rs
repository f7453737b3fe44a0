//! Authentication and profile endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfile, User},
    AppState,
};

use super::AuthenticatedUser;

/// Citizen sign-up
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already used")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with username or email
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or banned account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state.services.users.login(request).await?;
    Ok(Json(response))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;
    Ok(Json(user))
}

/// Update current user profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated or wrong current password")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(profile): Json<UpdateProfile>,
) -> AppResult<Json<User>> {
    let user = state
        .services
        .users
        .update_profile(claims.user_id, profile)
        .await?;
    Ok(Json(user))
}
