//! Outgoing email notifications
//!
//! Notifications are best effort: a delivery failure is logged and never
//! undoes the operation that triggered it.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl OutgoingMessage {
    pub fn new(to: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Sends messages to users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: OutgoingMessage) -> AppResult<()>;
}

/// Send a message, logging instead of failing. Returns whether it was sent.
pub async fn deliver(notifier: &dyn Notifier, message: OutgoingMessage) -> bool {
    if message.to.is_empty() {
        tracing::debug!(subject = %message.subject, "Notification has no recipient");
        return false;
    }

    let subject = message.subject.clone();
    let recipients = message.to.len();
    match notifier.send(message).await {
        Ok(()) => {
            tracing::debug!(%subject, recipients, "Notification sent");
            true
        }
        Err(e) => {
            tracing::warn!(%subject, error = %e, "Notification could not be delivered");
            false
        }
    }
}

/// SMTP notifier
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, message: &OutgoingMessage) -> AppResult<Message> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Lost & Found");
        let from_address = self
            .config
            .smtp_from
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        let from_mailbox = Mailbox::new(Some(from_name.to_string()), from_address);

        let mut builder = Message::builder().from(from_mailbox).subject(&message.subject);
        for to in &message.to {
            let to_mailbox = Mailbox::from_str(to)
                .map_err(|e| AppError::Internal(format!("Invalid to address {}: {}", to, e)))?;
            builder = builder.to(to_mailbox);
        }

        let text = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone());

        let email = match &message.attachment {
            None => builder.singlepart(text),
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    AppError::Internal(format!("Invalid attachment content type: {}", e))
                })?;
                builder.multipart(
                    MultiPart::mixed().singlepart(text).singlepart(
                        MailAttachment::new(attachment.filename.clone())
                            .body(attachment.bytes.clone(), content_type),
                    ),
                )
            }
        }
        .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        Ok(email)
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(mailer_builder.build())
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, message: OutgoingMessage) -> AppResult<()> {
        if !self.config.enabled {
            tracing::info!(
                to = ?message.to,
                subject = %message.subject,
                "Email disabled, message dropped"
            );
            return Ok(());
        }

        let email = self.build_message(&message)?;
        let mailer = self.transport()?;

        // lettre's SMTP transport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &[&str]) -> OutgoingMessage {
        OutgoingMessage::new(
            to.iter().map(|s| s.to_string()).collect(),
            "Restitution scheduled",
            "See you at the station",
        )
    }

    #[tokio::test]
    async fn test_deliver_swallows_failures() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_| Err(AppError::Internal("smtp down".to_string())));

        assert!(!deliver(&notifier, message(&["alice@example.org"])).await);
    }

    #[tokio::test]
    async fn test_deliver_skips_empty_recipients() {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().never();

        assert!(!deliver(&notifier, message(&[])).await);
    }

    #[tokio::test]
    async fn test_deliver_reports_success() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|m| m.to == vec!["bob@example.org".to_string()])
            .times(1)
            .returning(|_| Ok(()));

        assert!(deliver(&notifier, message(&["bob@example.org"])).await);
    }

    #[tokio::test]
    async fn test_disabled_email_is_dropped() {
        let service = EmailService::new(EmailConfig::default());
        assert!(service.send(message(&["alice@example.org"])).await.is_ok());
    }

    #[test]
    fn test_build_message_with_attachment() {
        let service = EmailService::new(EmailConfig::default());
        let msg = message(&["alice@example.org", "bob@example.org"]).with_attachment(Attachment {
            filename: "restitution-12.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.3".to_vec(),
        });
        assert!(service.build_message(&msg).is_ok());

        let invalid = message(&["not an address"]);
        assert!(service.build_message(&invalid).is_err());
    }
}
