//! Mapping of domain errors onto HTTP errors.
//!
//! Details go to the log; responses carry a short generic message.

use crate::forms::FormError;
use crate::questions::QuestionError;
use crate::registration::RegistrationError;
use actix_web::{error, Error};
use sea_orm::DbErr;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

pub fn db_error(err: DbErr) -> Error {
    log::error!("Database error: {}", err);
    error::ErrorInternalServerError(GENERIC_FAILURE)
}

pub fn form_error(err: FormError) -> Error {
    match err {
        FormError::EventNotFound(_) => error::ErrorNotFound("Event not found."),
        FormError::Misconfigured { .. } => {
            log::error!("{}", err);
            error::ErrorInternalServerError(GENERIC_FAILURE)
        }
        FormError::Db(err) => db_error(err),
    }
}

/// Everything except validation failures, which the form page renders itself.
pub fn registration_error(err: RegistrationError) -> Error {
    match err {
        RegistrationError::EventNotFound(_) => error::ErrorNotFound("Event not found."),
        RegistrationError::EventClosed(_) => {
            error::ErrorForbidden("Registration for this event is closed.")
        }
        RegistrationError::Validation(errors) => error::ErrorBadRequest(errors.to_string()),
        RegistrationError::Storage(err) => db_error(err),
        err => {
            log::error!("Registration failed: {}", err);
            error::ErrorInternalServerError(GENERIC_FAILURE)
        }
    }
}

pub fn question_error(err: QuestionError) -> Error {
    match err {
        QuestionError::EventNotFound(_) => error::ErrorNotFound("Event not found."),
        QuestionError::NotFound(_) => error::ErrorNotFound("Question not found."),
        QuestionError::Db(err) => db_error(err),
        err => {
            log::debug!("Rejected question input: {}", err);
            error::ErrorBadRequest(err.to_string())
        }
    }
}
