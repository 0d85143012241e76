//! Attendee signup pages: the form schema, the HTML form and its submission.

use super::error::{db_error, form_error, registration_error};
use crate::events::{find_active_event, EventStatus};
use crate::forms::{build_form_schema, FieldDescriptor, FormSchema, SubmittedForm, ValidationErrors};
use crate::middleware::csrf::{validate_csrf_token, CSRF_FORM_FIELD};
use crate::middleware::ClientCtx;
use crate::notify::Notifier;
use crate::orm::events;
use crate::registration::{
    answers_for, register_and_notify, registration_for, AnswerRow, RegistrationError,
};
use actix_web::http::header;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_form_schema)
        .service(view_register_form)
        .service(submit_register_form);
}

/// One choice of a select field, as rendered.
struct OptionView {
    value: String,
    selected: bool,
}

/// One field of the signup form with what the user entered last time.
struct FieldView {
    key: String,
    label: String,
    widget: &'static str,
    required: bool,
    value: String,
    options: Vec<OptionView>,
    error: Option<String>,
}

impl FieldView {
    fn new(field: &FieldDescriptor, form: &SubmittedForm, errors: &ValidationErrors) -> Self {
        let submitted = form.get(&field.key);
        Self {
            key: field.key.clone(),
            label: field.label.clone(),
            widget: field.kind.widget(),
            required: field.required,
            value: submitted.first().cloned().unwrap_or_default(),
            options: field
                .choices
                .iter()
                .map(|choice| OptionView {
                    value: choice.clone(),
                    selected: submitted.iter().any(|value| value.trim() == choice),
                })
                .collect(),
            error: errors.get(&field.key).map(|e| e.message.clone()),
        }
    }
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    client: ClientCtx,
    event: events::Model,
    fields: Vec<FieldView>,
    has_errors: bool,
}

impl RegisterTemplate {
    fn new(
        client: ClientCtx,
        event: events::Model,
        schema: &FormSchema,
        form: &SubmittedForm,
        errors: &ValidationErrors,
    ) -> Self {
        Self {
            client,
            event,
            fields: schema
                .fields
                .iter()
                .map(|field| FieldView::new(field, form, errors))
                .collect(),
            has_errors: !errors.is_empty(),
        }
    }
}

#[derive(Template)]
#[template(path = "register_done.html")]
struct RegisterDoneTemplate {
    client: ClientCtx,
    event: events::Model,
    answers: Vec<AnswerRow>,
    just_registered: bool,
    /// Whether this request tried to send a confirmation.
    confirmation_attempted: bool,
    confirmation_sent: bool,
}

async fn open_event(db: &DatabaseConnection, event_id: i32) -> Result<events::Model, Error> {
    let event = find_active_event(db, event_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Event not found."))?;
    if EventStatus::of(&event, Utc::now().naive_utc()) == EventStatus::Past {
        return Err(error::ErrorForbidden("Registration for this event is closed."));
    }
    Ok(event)
}

/// GET /events/{id}/form - Field descriptors of the signup form as JSON
#[get("/events/{event_id}/form")]
pub async fn view_form_schema(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let event_id = path.into_inner();
    find_active_event(&db, event_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Event not found."))?;

    let schema = build_form_schema(&db, event_id).await.map_err(form_error)?;
    Ok(HttpResponse::Ok().json(schema))
}

/// GET /events/{id}/register - Signup form, or the stored answers once registered
#[get("/events/{event_id}/register")]
pub async fn view_register_form(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    let event_id = path.into_inner();

    let event = find_active_event(&db, event_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Event not found."))?;

    if let Some(attendee) = registration_for(&db, user_id, event_id)
        .await
        .map_err(db_error)?
    {
        let answers = answers_for(&db, attendee.id).await.map_err(db_error)?;
        return Ok(RegisterDoneTemplate {
            client,
            event,
            answers,
            just_registered: false,
            confirmation_attempted: false,
            confirmation_sent: false,
        }
        .to_response());
    }

    let event = open_event(&db, event_id).await?;
    let schema = build_form_schema(&db, event_id).await.map_err(form_error)?;

    Ok(RegisterTemplate::new(
        client,
        event,
        &schema,
        &SubmittedForm::new(),
        &ValidationErrors::new(),
    )
    .to_response())
}

/// POST /events/{id}/register - Submit the signup form
#[post("/events/{event_id}/register")]
pub async fn submit_register_form(
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Arc<dyn Notifier>>,
    path: web::Path<i32>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<impl Responder, Error> {
    let event_id = path.into_inner();

    let mut csrf_token = String::new();
    let mut submitted = SubmittedForm::new();
    for (key, value) in form.into_inner() {
        if key == CSRF_FORM_FIELD {
            csrf_token = value;
        } else {
            submitted.push(key, value);
        }
    }

    // Validate CSRF token
    validate_csrf_token(&cookies, &csrf_token)?;

    let user_id = client.require_login()?;

    match register_and_notify(&db, notifier.get_ref().as_ref(), event_id, user_id, &submitted).await {
        Ok(report) if report.submission.is_new() => {
            let event = find_active_event(&db, event_id)
                .await
                .map_err(db_error)?
                .ok_or_else(|| error::ErrorNotFound("Event not found."))?;
            let answers = answers_for(&db, report.submission.attendee_id())
                .await
                .map_err(db_error)?;
            Ok(RegisterDoneTemplate {
                client,
                event,
                answers,
                just_registered: true,
                confirmation_attempted: report.notification.is_some(),
                confirmation_sent: report.notified(),
            }
            .to_response())
        }
        Ok(_) => Ok(HttpResponse::SeeOther()
            .insert_header((header::LOCATION, format!("/events/{}/register", event_id)))
            .finish()),
        Err(RegistrationError::Validation(errors)) => {
            let event = open_event(&db, event_id).await?;
            let schema = build_form_schema(&db, event_id).await.map_err(form_error)?;
            Ok(RegisterTemplate::new(client, event, &schema, &submitted, &errors).to_response())
        }
        Err(err) => Err(registration_error(err)),
    }
}
