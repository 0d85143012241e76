/// Email sending functionality
///
/// Sends mail through lettre's SMTP transport. With `email.mock` set the
/// message is only logged, which is what development and tests use.
pub mod smtp;
pub mod templates;

use crate::app_config::EmailConfig;
use thiserror::Error;

/// Email sending result
pub type EmailResult<T> = Result<T, EmailError>;

/// Email errors
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP or address configuration error
    #[error("Email config error: {0}")]
    ConfigError(String),
    /// Email building error
    #[error("Email build error: {0}")]
    BuildError(#[from] lettre::error::Error),
    /// Message body rendering error
    #[error("Email template error: {0}")]
    TemplateError(#[from] askama::Error),
    /// Email sending error
    #[error("Email send error: {0}")]
    SendError(#[from] lettre::transport::smtp::Error),
}

/// A message ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Send an email
pub async fn send_email(config: &EmailConfig, email: &OutgoingEmail) -> EmailResult<()> {
    if config.mock {
        log::info!("MOCK EMAIL:");
        log::info!("  To: {}", email.to);
        log::info!("  Subject: {}", email.subject);
        log::info!("  Body: {}", email.body_text);
        return Ok(());
    }

    smtp::send_email(config, email).await
}
