use std::env;
use std::sync::Mutex;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::secret::Secret;

pub const DEFAULT_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_PORT: u16 = 587;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("EMAIL_USERNAME and EMAIL_PASSWORD must be set to email the report")]
    MissingCredentials,
    #[error("EMAIL_PORT must be a number, got {0:?}")]
    InvalidPort(String),
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("building mail message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("sending mail: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Delivers a rendered report to a recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// SMTP settings, sourced from the environment at notification time.
#[derive(Debug)]
pub struct MailerConfig {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
}

impl MailerConfig {
    /// EMAIL_USERNAME and EMAIL_PASSWORD are required; EMAIL_HOST and
    /// EMAIL_PORT fall back to smtp.gmail.com:587.
    pub fn from_env() -> Result<Self, MailError> {
        let username = env::var("EMAIL_USERNAME").map_err(|_| MailError::MissingCredentials)?;
        let password = env::var("EMAIL_PASSWORD").map_err(|_| MailError::MissingCredentials)?;

        let host = env::var("EMAIL_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("EMAIL_PORT") {
            Ok(raw) => raw.parse().map_err(|_| MailError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            username,
            password: Secret::new(password),
            host,
            port,
        })
    }
}

/// Sends report mail through an authenticated SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: MailerConfig) -> Result<Self, MailError> {
        let from: Mailbox = config.username.parse()?;
        let credentials = Credentials::new(config.username, config.password.expose().clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self { transport, from })
    }

    pub fn from_env() -> Result<Self, MailError> {
        Self::new(MailerConfig::from_env()?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .body(body.to_string())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Captured outbound mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records mail instead of sending it.
#[derive(Debug, Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
