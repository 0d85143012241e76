//! Post-commit registration notifications.
//!
//! Runs strictly after the registration transaction has committed. Its
//! outcome is reported next to the registration and never undoes it.

use crate::app_config::{EmailConfig, SiteConfig};
use crate::email::templates::{registration_confirmation, Confirmation};
use crate::email::{send_email, EmailError};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("could not load confirmation details: {0}")]
    Lookup(#[from] DbErr),
    #[error("registration {0} no longer exists")]
    MissingRegistration(i32),
}

/// Something that tells an attendee their registration went through.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn registration_confirmed(&self, confirmation: &Confirmation) -> Result<(), NotifyError>;
}

/// Sends the confirmation by email.
#[derive(Clone, Debug)]
pub struct EmailNotifier {
    pub email: EmailConfig,
    pub site: SiteConfig,
}

impl EmailNotifier {
    pub fn new(email: EmailConfig, site: SiteConfig) -> Self {
        Self { email, site }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn registration_confirmed(&self, confirmation: &Confirmation) -> Result<(), NotifyError> {
        let message = registration_confirmation(confirmation, &self.site.name, &self.site.base_url)?;
        send_email(&self.email, &message).await?;
        Ok(())
    }
}
