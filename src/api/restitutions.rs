//! Restitution endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        declaration::ScheduleRestitution,
        item::StateChange,
        restitution::{RestitutionDetails, RestitutionQuery, RestitutionVerification},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Schedule the restitution of a claimed declaration
#[utoipa::path(
    post,
    path = "/declarations/{id}/restitution",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Declaration ID")),
    request_body = ScheduleRestitution,
    responses(
        (status = 201, description = "Restitution scheduled", body = StateChange),
        (status = 400, description = "Missing finder or claimant, or date in the past"),
        (status = 403, description = "Officers only"),
        (status = 422, description = "Item is not claimed")
    )
)]
pub async fn schedule(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(declaration_id): Path<i32>,
    Json(request): Json<ScheduleRestitution>,
) -> AppResult<(StatusCode, Json<StateChange>)> {
    claims.require_officer()?;

    let change = state
        .services
        .restitutions
        .schedule(claims.actor(), declaration_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(change)))
}

/// List restitutions
#[utoipa::path(
    get,
    path = "/restitutions",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(RestitutionQuery),
    responses(
        (status = 200, description = "Restitutions", body = Vec<RestitutionDetails>),
        (status = 403, description = "Officers only")
    )
)]
pub async fn list_restitutions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RestitutionQuery>,
) -> AppResult<Json<Vec<RestitutionDetails>>> {
    claims.require_officer()?;

    let restitutions = state.services.restitutions.list(query.status).await?;
    Ok(Json(restitutions))
}

/// Restitutions where the current citizen is finder or claimant
#[utoipa::path(
    get,
    path = "/restitutions/mine",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Restitutions of the current citizen", body = Vec<RestitutionDetails>)
    )
)]
pub async fn list_mine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RestitutionDetails>>> {
    claims.require_citizen()?;

    let restitutions = state
        .services
        .restitutions
        .list_for_citizen(claims.user_id)
        .await?;
    Ok(Json(restitutions))
}

/// Restitution details
#[utoipa::path(
    get,
    path = "/restitutions/{id}",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Restitution details", body = RestitutionDetails),
        (status = 403, description = "Citizen not involved in the restitution"),
        (status = 404, description = "Restitution not found")
    )
)]
pub async fn get_restitution(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RestitutionDetails>> {
    let restitution = state
        .services
        .restitutions
        .get_details(claims.actor(), id)
        .await?;
    Ok(Json(restitution))
}

/// Mark a planned restitution as done
#[utoipa::path(
    post,
    path = "/restitutions/{id}/complete",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Restitution completed", body = StateChange),
        (status = 403, description = "Not the creating officer"),
        (status = 422, description = "Restitution is not planned")
    )
)]
pub async fn complete(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StateChange>> {
    claims.require_officer()?;

    let change = state.services.restitutions.complete(claims.actor(), id).await?;
    Ok(Json(change))
}

/// Cancel a planned restitution
#[utoipa::path(
    post,
    path = "/restitutions/{id}/cancel",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Item state change", body = StateChange),
        (status = 403, description = "Not the creating officer"),
        (status = 422, description = "Restitution is not planned")
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StateChange>> {
    claims.require_officer()?;

    let change = state.services.restitutions.cancel(claims.actor(), id).await?;
    Ok(Json(change))
}

/// Delete a planned or disputed restitution
#[utoipa::path(
    delete,
    path = "/restitutions/{id}",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Item state change", body = StateChange),
        (status = 403, description = "Not the creating officer"),
        (status = 422, description = "Restitution already done")
    )
)]
pub async fn delete_restitution(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StateChange>> {
    claims.require_officer()?;

    let change = state.services.restitutions.delete(claims.actor(), id).await?;
    Ok(Json(change))
}

/// Dispute a completed restitution
#[utoipa::path(
    post,
    path = "/restitutions/{id}/reopen",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Item state change", body = StateChange),
        (status = 403, description = "Not the claimant"),
        (status = 422, description = "Restitution is not done")
    )
)]
pub async fn reopen(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<StateChange>> {
    claims.require_citizen()?;

    let change = state.services.restitutions.reopen(claims.actor(), id).await?;
    Ok(Json(change))
}

/// Download the proof of return
#[utoipa::path(
    get,
    path = "/restitutions/{id}/proof",
    tag = "restitutions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Proof document", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Restitution not found"),
        (status = 422, description = "Restitution is not done")
    )
)]
pub async fn download_proof(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    claims.require_officer()?;

    let proof = state.services.restitutions.proof(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", proof.filename);
    Ok((
        [
            (header::CONTENT_TYPE, proof.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        proof.bytes,
    ))
}

/// Check a restitution from its proof's QR code
#[utoipa::path(
    get,
    path = "/restitutions/{id}/verify",
    tag = "restitutions",
    params(("id" = i32, Path, description = "Restitution ID")),
    responses(
        (status = 200, description = "Restitution status", body = RestitutionVerification),
        (status = 404, description = "Restitution not found")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<RestitutionVerification>> {
    let verification = state.services.restitutions.verify(id).await?;
    Ok(Json(verification))
}
