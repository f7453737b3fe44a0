//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{CreateAdmin, CreateOfficer, OfficerCreated, UpdateUser, User, UserQuery},
    AppState,
};

use super::AuthenticatedUser;

/// List users with role filter and search
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<User>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<User>>> {
    claims.require_admin()?;

    let users = state.services.users.search(&query).await?;
    Ok(Json(users))
}

/// Create a police officer; the generated password is emailed
#[utoipa::path(
    post,
    path = "/users/officers",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateOfficer,
    responses(
        (status = 201, description = "Officer created", body = OfficerCreated),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already used")
    )
)]
pub async fn create_officer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateOfficer>,
) -> AppResult<(StatusCode, Json<OfficerCreated>)> {
    claims.require_admin()?;

    let created = state.services.users.create_officer(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Create an administrator
#[utoipa::path(
    post,
    path = "/users/admins",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateAdmin,
    responses(
        (status = 201, description = "Administrator created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already used")
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateAdmin>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;

    let created = state.services.users.create_admin(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let updated = state.services.users.update_user(id, update).await?;
    Ok(Json(updated))
}

/// Delete a user and the items they declared
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Administrators cannot delete themselves")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.users.delete_user(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ban a citizen
#[utoipa::path(
    post,
    path = "/users/{id}/ban",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Citizen banned", body = User),
        (status = 404, description = "User not found"),
        (status = 422, description = "Only citizens can be banned")
    )
)]
pub async fn ban_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let user = state.services.users.set_banned(id, true).await?;
    Ok(Json(user))
}

/// Lift a citizen's ban
#[utoipa::path(
    post,
    path = "/users/{id}/unban",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Citizen unbanned", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn unban_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let user = state.services.users.set_banned(id, false).await?;
    Ok(Json(user))
}
