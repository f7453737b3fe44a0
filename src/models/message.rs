//! Contact messages and admin notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ContactMessage {
    pub id: i32,
    /// Set when the form was sent by a logged-in user
    pub sender_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub reply: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub handled: bool,
    pub crea_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateContactMessage {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplyMessage {
    #[validate(length(min = 1, max = 5000, message = "Reply must be 1-5000 characters"))]
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub message: String,
    pub read: bool,
    pub crea_date: DateTime<Utc>,
}
