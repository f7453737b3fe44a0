//! Contact form and notification endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::message::{ContactMessage, CreateContactMessage, Notification, ReplyMessage},
    AppState,
};

use super::{AuthenticatedUser, OptionalUser};

/// Send a message to the administrators
#[utoipa::path(
    post,
    path = "/contact",
    tag = "messages",
    request_body = CreateContactMessage,
    responses(
        (status = 201, description = "Message received", body = ContactMessage),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    OptionalUser(claims): OptionalUser,
    Json(data): Json<CreateContactMessage>,
) -> AppResult<(StatusCode, Json<ContactMessage>)> {
    let sender_id = claims.map(|c| c.user_id);
    let message = state.services.messages.submit(sender_id, data).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Contact messages", body = Vec<ContactMessage>),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ContactMessage>>> {
    claims.require_admin()?;

    let messages = state.services.messages.list().await?;
    Ok(Json(messages))
}

/// Reply to a contact message by email
#[utoipa::path(
    post,
    path = "/messages/{id}/reply",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Message ID")),
    request_body = ReplyMessage,
    responses(
        (status = 200, description = "Reply stored and sent", body = ContactMessage),
        (status = 404, description = "Message not found")
    )
)]
pub async fn reply_message(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<ReplyMessage>,
) -> AppResult<Json<ContactMessage>> {
    claims.require_admin()?;

    let message = state.services.messages.reply(id, data).await?;
    Ok(Json(message))
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "messages",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications of the current admin", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Notification>>> {
    claims.require_admin()?;

    let notifications = state
        .services
        .messages
        .notifications(claims.user_id)
        .await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Notification>> {
    claims.require_admin()?;

    let notification = state.services.messages.mark_read(claims.user_id, id).await?;
    Ok(Json(notification))
}
