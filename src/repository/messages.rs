//! Contact messages and notifications repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        message::{ContactMessage, CreateContactMessage, Notification},
    },
};

#[derive(Clone)]
pub struct MessagesRepository {
    pool: Pool<Postgres>,
}

impl MessagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        sender_id: Option<i32>,
        data: &CreateContactMessage,
    ) -> AppResult<ContactMessage> {
        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (sender_id, name, email, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(sender_id)
        .bind(data.name.trim())
        .bind(data.email.trim())
        .bind(&data.body)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// All messages, unhandled first
    pub async fn list(&self) -> AppResult<Vec<ContactMessage>> {
        let messages = sqlx::query_as::<_, ContactMessage>(
            "SELECT * FROM contact_messages ORDER BY handled, crea_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ContactMessage> {
        sqlx::query_as::<_, ContactMessage>("SELECT * FROM contact_messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message with id {} not found", id)))
    }

    /// Store the reply and mark the message handled
    pub async fn save_reply(&self, id: i32, reply: &str) -> AppResult<ContactMessage> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            UPDATE contact_messages
            SET reply = $2, replied_at = NOW(), handled = TRUE
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reply)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message with id {} not found", id)))
    }

    /// Add a notification for every administrator
    pub async fn notify_admins(&self, message: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, message) SELECT id, $1 FROM users WHERE role = $2",
        )
        .bind(message)
        .bind(Role::Admin)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn notifications_for(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY read, crea_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: i32, user_id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification with id {} not found", id)))
    }
}
