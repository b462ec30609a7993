use crate::core::config::SmtpConfig;
use crate::core::{EmailMessage, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, info, instrument};

fn build_message(message: &EmailMessage) -> Result<Message> {
    let from: Mailbox = message
        .from
        .parse()
        .with_context(|| format!("Invalid sender address: '{}'", message.from))?;
    let to: Mailbox = message
        .to
        .parse()
        .with_context(|| format!("Invalid recipient address: '{}'", message.to))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(&message.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .context("Failed to build email message")
}

/// Delivers alerts through an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self> {
        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .with_context(|| format!("Failed to configure SMTP relay: {}", config.host))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port).timeout(Some(timeout));
        if let Some(username) = &config.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        Ok(SmtpNotifier {
            transport: builder.build(),
            relay: format!("{}:{}", config.host, config.port),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(name = "SmtpSend", skip(self, message), fields(relay = %self.relay, to = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = build_message(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .with_context(|| format!("Failed to send email via {}", self.relay))?;
        debug!(code = %response.code(), "SMTP relay accepted message");
        info!("Alert email sent");
        Ok(())
    }
}

fn preview(message: &EmailMessage) -> String {
    format!(
        "From: {}\nTo: {}\nSubject: {}\n\n{}",
        message.from, message.to, message.subject, message.body
    )
}

/// Prints the email to stderr instead of sending it. Stdout is left to the
/// status line.
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        build_message(message)?;
        eprintln!("{}", preview(message));
        Ok(())
    }
}
