/// SMTP email sending implementation
use super::{EmailError, EmailResult, OutgoingEmail};
use crate::app_config::EmailConfig;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Build the lettre message for `email`.
pub fn build_message(config: &EmailConfig, email: &OutgoingEmail) -> EmailResult<Message> {
    let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("Invalid from address: {}", e)))?;

    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("Invalid to address: {}", e)))?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str());

    // Plain text only, or multipart with HTML
    let message = match &email.body_html {
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.body_text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        )?,
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body_text.clone())?,
    };

    Ok(message)
}

/// Send an email via SMTP
pub async fn send_email(config: &EmailConfig, email: &OutgoingEmail) -> EmailResult<()> {
    let message = build_message(config, email)?;

    let mut builder = if config.smtp_tls {
        SmtpTransport::relay(&config.smtp_host)?
    } else {
        SmtpTransport::builder_dangerous(&config.smtp_host)
    };
    builder = builder.port(config.smtp_port);
    if !config.smtp_username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ));
    }

    builder.build().send(&message)?;

    log::info!("Email sent successfully to: {}", email.to);

    Ok(())
}
