use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailError, EmailResult};
use crate::core::config::MailConfig;

pub(super) fn build_transport(
    config: &MailConfig,
    host: &str,
) -> EmailResult<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = if config.use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
    };

    let builder = if config.smtp_username.is_empty() {
        builder
    } else {
        builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ))
    };

    Ok(builder.port(config.smtp_port).build())
}

pub(super) fn build_message(
    config: &MailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
) -> EmailResult<Message> {
    let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .map_err(|e| EmailError::Config(format!("Invalid from address: {}", e)))?;

    let to: Mailbox = to
        .parse()
        .map_err(|e| EmailError::Config(format!("Invalid to address: {}", e)))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body_text.to_string())?;

    Ok(message)
}

pub(super) async fn deliver(
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    message: Message,
) -> EmailResult<()> {
    transport.send(message).await?;
    Ok(())
}
