//! Police station endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::station::{CreateStation, PoliceStation, UpdateStation},
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/stations",
    tag = "stations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Police stations", body = Vec<PoliceStation>)
    )
)]
pub async fn list_stations(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<PoliceStation>>> {
    let stations = state.services.stations.list().await?;
    Ok(Json(stations))
}

#[utoipa::path(
    post,
    path = "/stations",
    tag = "stations",
    security(("bearer_auth" = [])),
    request_body = CreateStation,
    responses(
        (status = 201, description = "Station created", body = PoliceStation),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn create_station(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateStation>,
) -> AppResult<(StatusCode, Json<PoliceStation>)> {
    claims.require_admin()?;

    let station = state.services.stations.create(data).await?;
    Ok((StatusCode::CREATED, Json(station)))
}

#[utoipa::path(
    put,
    path = "/stations/{id}",
    tag = "stations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Station ID")),
    request_body = UpdateStation,
    responses(
        (status = 200, description = "Station updated", body = PoliceStation),
        (status = 404, description = "Station not found")
    )
)]
pub async fn update_station(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateStation>,
) -> AppResult<Json<PoliceStation>> {
    claims.require_admin()?;

    let station = state.services.stations.update(id, data).await?;
    Ok(Json(station))
}

#[utoipa::path(
    delete,
    path = "/stations/{id}",
    tag = "stations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Station ID")),
    responses(
        (status = 204, description = "Station deleted"),
        (status = 404, description = "Station not found"),
        (status = 409, description = "Station still referenced")
    )
)]
pub async fn delete_station(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.stations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
