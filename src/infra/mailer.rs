//! Outgoing email delivery over SMTP.
//!
//! When SMTP is not configured, development builds log messages instead of
//! sending them; any other environment refuses to start.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use serde::{Deserialize, Serialize};

use crate::config::{Config, SmtpConfig};
use crate::domain::ConfirmationMessage;
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// A rendered message with HTML and plain text alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl From<ConfirmationMessage> for OutgoingEmail {
    fn from(msg: ConfirmationMessage) -> Self {
        Self {
            to: msg.to,
            subject: msg.subject,
            html: msg.html,
            text: msg.text,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// Pick the mailer for this environment.
pub fn mailer_from_config(config: &Config) -> AppResult<Arc<dyn Mailer>> {
    if config.smtp.is_configured() {
        return Ok(Arc::new(SmtpMailer::new(&config.smtp)?));
    }

    let missing = config.smtp.missing().join(", ");
    if config.is_development() {
        tracing::warn!(missing = %missing, "SMTP not configured - emails will be logged");
        Ok(Arc::new(LogMailer))
    } else {
        Err(AppError::internal(format!(
            "SMTP configuration missing: {}",
            missing
        )))
    }
}

/// lettre SMTP transport
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::internal("SMTP_HOST is not set"))?;
        let from: Mailbox = config
            .sender()
            .ok_or_else(|| AppError::internal("MAIL_FROM is not set"))?
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid sender address: {}", e)))?;

        let builder = if config.secure {
            SmtpTransport::relay(host)
        } else {
            SmtpTransport::starttls_relay(host)
        }
        .map_err(|e| AppError::internal(format!("Invalid SMTP relay: {}", e)))?;

        let credentials = Credentials::new(
            config.user.clone().unwrap_or_default(),
            config.password().unwrap_or_default().to_string(),
        );

        let transport = builder
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %host, port = config.port, "SMTP mailer initialized");

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &OutgoingEmail) -> AppResult<Message> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid recipient address: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )
            .map_err(|e| AppError::internal(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let message = self.build_message(&email)?;

        // SmtpTransport is blocking
        let transport = self.transport.clone();
        let result = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| AppError::internal(format!("Mail task failed: {}", e)))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %email.to, "Failed to send email");
                Err(AppError::internal(format!("Failed to send email: {}", e)))
            }
        }
    }
}

/// Development mailer that only logs.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            email.to,
            email.subject,
            email.text
        );
        Ok(())
    }
}
