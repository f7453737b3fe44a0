//! Contact form, admin replies and notifications

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        enums::Role,
        message::{ContactMessage, CreateContactMessage, Notification, ReplyMessage},
    },
    repository::Repository,
    services::email::{deliver, Notifier, OutgoingMessage},
};

#[derive(Clone)]
pub struct MessagesService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
}

impl MessagesService {
    pub fn new(repository: Repository, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Store a contact message and alert the administrators
    pub async fn submit(
        &self,
        sender_id: Option<i32>,
        data: CreateContactMessage,
    ) -> AppResult<ContactMessage> {
        data.validate()?;
        let message = self.repository.messages.create(sender_id, &data).await?;

        let notice = format!("New contact message from {} <{}>", message.name, message.email);
        if let Err(e) = self.repository.messages.notify_admins(&notice).await {
            tracing::warn!(message_id = message.id, error = %e, "Admin notification not stored");
        }

        match self.repository.users.emails_by_role(Role::Admin).await {
            Ok(admins) => {
                let body = format!("{}:\n\n{}\n", notice, message.body);
                deliver(
                    self.notifier.as_ref(),
                    OutgoingMessage::new(admins, "New contact message", body),
                )
                .await;
            }
            Err(e) => {
                tracing::warn!(message_id = message.id, error = %e, "Admins could not be emailed");
            }
        }

        Ok(message)
    }

    pub async fn list(&self) -> AppResult<Vec<ContactMessage>> {
        self.repository.messages.list().await
    }

    /// Store the reply and send it to the author of the message
    pub async fn reply(&self, id: i32, data: ReplyMessage) -> AppResult<ContactMessage> {
        data.validate()?;
        let original = self.repository.messages.get_by_id(id).await?;
        let message = self.repository.messages.save_reply(id, &data.reply).await?;

        let body = format!(
            "Hello {},\n\n{}\n\n---\nYour message:\n{}\n",
            original.name, data.reply, original.body
        );
        deliver(
            self.notifier.as_ref(),
            OutgoingMessage::new(vec![original.email], "Reply to your message", body),
        )
        .await;

        Ok(message)
    }

    pub async fn notifications(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        self.repository.messages.notifications_for(user_id).await
    }

    pub async fn mark_read(&self, user_id: i32, id: i32) -> AppResult<Notification> {
        self.repository.messages.mark_read(id, user_id).await
    }
}
