//! Declaration endpoints: citizen reports, finders and claimants

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        declaration::{
            CreateDeclaration, Declaration, DeclarationDetails, DeclarationQuery,
            DeclarationSummary, UpdateDeclaration,
        },
        enums::DeclarationKind,
        item::StateChange,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Search term for the public lost/found lists
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct KindQuery {
    pub kind: Option<DeclarationKind>,
}

/// Declare a lost or found item
#[utoipa::path(
    post,
    path = "/declarations",
    tag = "declarations",
    security(("bearer_auth" = [])),
    request_body = CreateDeclaration,
    responses(
        (status = 201, description = "Declaration created", body = Declaration),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Citizens only")
    )
)]
pub async fn create_declaration(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateDeclaration>,
) -> AppResult<(StatusCode, Json<Declaration>)> {
    claims.require_citizen()?;

    let declaration = state
        .services
        .declarations
        .create(claims.actor(), data)
        .await?;
    Ok((StatusCode::CREATED, Json(declaration)))
}

/// Update one of my declarations
#[utoipa::path(
    put,
    path = "/declarations/{id}",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Declaration ID")),
    request_body = UpdateDeclaration,
    responses(
        (status = 200, description = "Declaration updated", body = Declaration),
        (status = 403, description = "Not the declarant"),
        (status = 404, description = "Declaration not found")
    )
)]
pub async fn update_declaration(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateDeclaration>,
) -> AppResult<Json<Declaration>> {
    claims.require_citizen()?;

    let declaration = state
        .services
        .declarations
        .update(claims.actor(), id, data)
        .await?;
    Ok(Json(declaration))
}

/// Delete one of my declarations and its item
#[utoipa::path(
    delete,
    path = "/declarations/{id}",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Declaration ID")),
    responses(
        (status = 204, description = "Declaration deleted"),
        (status = 403, description = "Not the declarant"),
        (status = 404, description = "Declaration not found"),
        (status = 422, description = "A restitution is pending")
    )
)]
pub async fn delete_declaration(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_citizen()?;

    state.services.declarations.delete(claims.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Open lost declarations
#[utoipa::path(
    get,
    path = "/declarations/lost",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "Lost items still looked for", body = Vec<DeclarationSummary>)
    )
)]
pub async fn list_lost(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(search): Query<SearchQuery>,
) -> AppResult<Json<Vec<DeclarationSummary>>> {
    claims.require_citizen()?;
    list_open(&state, DeclarationKind::Lost, search).await
}

/// Open found declarations
#[utoipa::path(
    get,
    path = "/declarations/found",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "Found items waiting for their owner", body = Vec<DeclarationSummary>)
    )
)]
pub async fn list_found(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(search): Query<SearchQuery>,
) -> AppResult<Json<Vec<DeclarationSummary>>> {
    claims.require_citizen()?;
    list_open(&state, DeclarationKind::Found, search).await
}

async fn list_open(
    state: &AppState,
    kind: DeclarationKind,
    search: SearchQuery,
) -> AppResult<Json<Vec<DeclarationSummary>>> {
    let query = DeclarationQuery {
        kind: Some(kind),
        q: search.q,
    };
    let declarations = state.services.declarations.list_open(kind, &query).await?;
    Ok(Json(declarations))
}

/// My declarations
#[utoipa::path(
    get,
    path = "/declarations/mine",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(DeclarationQuery),
    responses(
        (status = 200, description = "Declarations of the current citizen", body = Vec<DeclarationSummary>)
    )
)]
pub async fn list_mine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<DeclarationQuery>,
) -> AppResult<Json<Vec<DeclarationSummary>>> {
    claims.require_citizen()?;

    let declarations = state
        .services
        .declarations
        .list_mine(claims.user_id, &query)
        .await?;
    Ok(Json(declarations))
}

/// Claimed declarations waiting for a restitution
#[utoipa::path(
    get,
    path = "/declarations/claimed",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(KindQuery),
    responses(
        (status = 200, description = "Claimed declarations", body = Vec<DeclarationSummary>),
        (status = 403, description = "Officers only")
    )
)]
pub async fn list_claimed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<KindQuery>,
) -> AppResult<Json<Vec<DeclarationSummary>>> {
    claims.require_officer()?;

    let declarations = state.services.declarations.list_claimed(query.kind).await?;
    Ok(Json(declarations))
}

/// Declaration details with finders and claimants
#[utoipa::path(
    get,
    path = "/declarations/{id}",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Declaration ID")),
    responses(
        (status = 200, description = "Declaration details", body = DeclarationDetails),
        (status = 404, description = "Declaration not found")
    )
)]
pub async fn get_declaration(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DeclarationDetails>> {
    let details = state.services.declarations.get_details(id).await?;
    Ok(Json(details))
}

/// Report having found the item of a lost declaration
#[utoipa::path(
    post,
    path = "/declarations/{id}/found",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Declaration ID")),
    responses(
        (status = 200, description = "Item state change", body = StateChange),
        (status = 403, description = "Own declaration or not a citizen"),
        (status = 409, description = "Already reported as finder"),
        (status = 422, description = "Not a lost declaration or item already returned")
    )
)]
pub async fn report_found(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StateChange>> {
    claims.require_citizen()?;

    let change = state
        .services
        .declarations
        .report_found(claims.actor(), id)
        .await?;
    Ok(Json(change))
}

/// Claim the item of a found declaration
#[utoipa::path(
    post,
    path = "/declarations/{id}/claim",
    tag = "declarations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Declaration ID")),
    responses(
        (status = 200, description = "Item state change", body = StateChange),
        (status = 403, description = "Own declaration or not a citizen"),
        (status = 409, description = "Already claimed by this citizen"),
        (status = 422, description = "Not a found declaration or item already returned")
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StateChange>> {
    claims.require_citizen()?;

    let change = state.services.declarations.claim(claims.actor(), id).await?;
    Ok(Json(change))
}
