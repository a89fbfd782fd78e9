//! Email sending for the notification side-channel
//!
//! Uses lettre's async SMTP transport. In mock mode (no SMTP host, or
//! `SMTP_MOCK=true`) emails are logged instead of sent.

mod smtp;

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use thiserror::Error;

use crate::core::config::MailConfig;

pub type EmailResult<T> = Result<T, EmailError>;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email config error: {0}")]
    Config(String),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Email send error: {0}")]
    Send(#[from] lettre::transport::smtp::Error),
}

pub struct Mailer {
    config: MailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl Mailer {
    pub fn new(config: MailConfig) -> EmailResult<Self> {
        let transport = match (&config.smtp_host, config.mock) {
            (Some(host), false) => Some(smtp::build_transport(&config, host)?),
            _ => None,
        };

        let mailer = Self { config, transport };
        if mailer.is_mock() {
            tracing::info!("Mailer running in mock mode; emails will be logged only");
        }

        Ok(mailer)
    }

    pub fn is_mock(&self) -> bool {
        self.transport.is_none()
    }

    pub async fn send(&self, to: &str, subject: &str, body_text: &str) -> EmailResult<()> {
        match &self.transport {
            Some(transport) => {
                let message = smtp::build_message(&self.config, to, subject, body_text)?;
                smtp::deliver(transport, message).await?;
                tracing::info!("Email sent successfully to: {}", to);
                Ok(())
            }
            None => {
                tracing::info!(to = %to, subject = %subject, "MOCK EMAIL\n{}", body_text);
                Ok(())
            }
        }
    }
}
