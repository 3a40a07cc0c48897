use crate::config::deserialize_option_parsed;
use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

pub const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid email address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to build email: {0}")]
    Build(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
    #[error("Failed to send email: {0}")]
    Send(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct MailConfig {
    #[serde(rename = "smtp_host", default = "default_smtp_host")]
    pub host: String,
    #[serde(
        rename = "smtp_port",
        default,
        deserialize_with = "deserialize_option_parsed"
    )]
    pub port: Option<u16>,
    #[serde(rename = "report_subject", default = "default_subject_label")]
    pub subject_label: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: None,
            subject_label: default_subject_label(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_subject_label() -> String {
    "📊 Daily Market Report".to_string()
}

/// The report as it will be mailed. Always addressed from and to the same mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEmail {
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipient: String,
}

impl ReportEmail {
    pub fn new(label: &str, address: &str, body: String, date: NaiveDate) -> Self {
        Self {
            subject: format!("{} ({})", label, date.format("%Y-%m-%d")),
            body,
            sender: address.to_string(),
            recipient: address.to_string(),
        }
    }

    pub fn to_message(&self) -> Result<Message, MailError> {
        let from = parse_mailbox(&self.sender)?;
        let to = parse_mailbox(&self.recipient)?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(&self.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

#[async_trait(?Send)]
pub trait MailTransport {
    async fn send(&self, message: Message) -> Result<(), MailError>;
}

/// Implicit-TLS SMTP submission. Built without a connection pool, so every send
/// opens its own session and the connection is dropped when the send returns.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig, username: &str, password: &str) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port.unwrap_or(DEFAULT_SMTP_PORT))
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self { transport })
    }
}

#[async_trait(?Send)]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), MailError> {
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Send(e.to_string()))
    }
}

/// Builds the message and hands it to the transport exactly once.
pub async fn dispatch<T: MailTransport>(
    transport: &T,
    email: &ReportEmail,
) -> Result<(), MailError> {
    let message = email.to_message()?;
    log::info!("sending '{}' to {}", email.subject, email.recipient);
    transport.send(message).await?;
    log::info!("report mailed to {}", email.recipient);
    Ok(())
}
