//! Item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::item::{ItemDetails, ItemPage, ItemQuery, RecentItems},
    AppState,
};

use super::AuthenticatedUser;

/// List items with state filter, search and pagination
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    params(ItemQuery),
    responses(
        (status = 200, description = "Paginated list of items", body = ItemPage),
        (status = 403, description = "Officers only")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<ItemPage>> {
    claims.require_officer()?;

    let page = state.services.items.search(&query).await?;
    Ok(Json(page))
}

/// Item details
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item details", body = ItemDetails),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ItemDetails>> {
    let item = state.services.items.get_details(id).await?;
    Ok(Json(item))
}

/// Delete an item with its declaration and restitutions
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Officers only"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_officer()?;

    state.services.items.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Latest lost and found items for the home page
#[utoipa::path(
    get,
    path = "/public/recent",
    tag = "items",
    responses(
        (status = 200, description = "Recent items", body = RecentItems)
    )
)]
pub async fn recent_items(State(state): State<AppState>) -> AppResult<Json<RecentItems>> {
    let recent = state.services.items.recent().await?;
    Ok(Json(recent))
}
