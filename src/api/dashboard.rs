//! Dashboard endpoints, one per role

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::dashboard::{AdminDashboard, CitizenDashboard, OfficerDashboard},
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/dashboard/admin",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Administration figures", body = AdminDashboard),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AdminDashboard>> {
    claims.require_admin()?;

    let dashboard = state.services.stats.admin_dashboard().await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/dashboard/officer",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Item and declaration figures", body = OfficerDashboard),
        (status = 403, description = "Officers only")
    )
)]
pub async fn officer_dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<OfficerDashboard>> {
    claims.require_officer()?;

    let dashboard = state.services.stats.officer_dashboard().await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/dashboard/citizen",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Figures of the current citizen", body = CitizenDashboard),
        (status = 403, description = "Citizens only")
    )
)]
pub async fn citizen_dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<CitizenDashboard>> {
    claims.require_citizen()?;

    let dashboard = state
        .services
        .stats
        .citizen_dashboard(claims.user_id)
        .await?;
    Ok(Json(dashboard))
}
