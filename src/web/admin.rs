/// Organizer tools
///
/// JSON endpoints for staff accounts: question management, attendee lists
/// and answer summaries. State-changing calls need the CSRF token in the
/// `X-CSRF-Token` header.
use super::error::{db_error, question_error};
use crate::events::find_event;
use crate::forms::{parse_choices, FieldKind};
use crate::middleware::csrf::validate_csrf_header;
use crate::middleware::ClientCtx;
use crate::orm::event_questions;
use crate::questions::{
    create_question, delete_question, list_questions, update_question, NewQuestion,
    QuestionChanges,
};
use crate::registration::attendees_with_answers;
use crate::summary::answer_summary;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, error, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_questions)
        .service(create_question_handler)
        .service(update_question_handler)
        .service(delete_question_handler)
        .service(view_attendees)
        .service(download_summary);
}

/// A question as organizers see it.
#[derive(Serialize)]
struct QuestionView {
    id: i32,
    event_id: i32,
    label: String,
    field_type: String,
    /// Human name of the kind; absent for an unsupported stored code.
    field_type_name: Option<&'static str>,
    is_required: bool,
    choices: Vec<String>,
    display_order: i32,
}

impl From<event_questions::Model> for QuestionView {
    fn from(question: event_questions::Model) -> Self {
        Self {
            id: question.id,
            event_id: question.event_id,
            field_type_name: FieldKind::from_code(&question.field_type).map(|k| k.display_name()),
            choices: parse_choices(&question.choices),
            label: question.label,
            field_type: question.field_type,
            is_required: question.is_required,
            display_order: question.display_order,
        }
    }
}

/// GET /admin/events/{id}/questions
#[get("/admin/events/{event_id}/questions")]
pub async fn view_questions(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let questions = list_questions(&db, path.into_inner())
        .await
        .map_err(question_error)?;
    let views: Vec<QuestionView> = questions.into_iter().map(QuestionView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// POST /admin/events/{id}/questions
#[post("/admin/events/{event_id}/questions")]
pub async fn create_question_handler(
    client: ClientCtx,
    cookies: actix_session::Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<NewQuestion>,
) -> Result<impl Responder, Error> {
    validate_csrf_header(&cookies, &req)?;
    let user_id = client.require_staff()?;
    let event_id = path.into_inner();

    let question = create_question(&db, event_id, &body)
        .await
        .map_err(question_error)?;
    log::info!("User {} added question {} to event {}", user_id, question.id, event_id);

    Ok(HttpResponse::Created().json(QuestionView::from(question)))
}

/// PATCH /admin/questions/{id}
#[patch("/admin/questions/{question_id}")]
pub async fn update_question_handler(
    client: ClientCtx,
    cookies: actix_session::Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<QuestionChanges>,
) -> Result<impl Responder, Error> {
    validate_csrf_header(&cookies, &req)?;
    client.require_staff()?;

    let question = update_question(&db, path.into_inner(), &body)
        .await
        .map_err(question_error)?;
    Ok(HttpResponse::Ok().json(QuestionView::from(question)))
}

/// DELETE /admin/questions/{id}
#[delete("/admin/questions/{question_id}")]
pub async fn delete_question_handler(
    client: ClientCtx,
    cookies: actix_session::Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    validate_csrf_header(&cookies, &req)?;
    let user_id = client.require_staff()?;
    let question_id = path.into_inner();

    delete_question(&db, question_id)
        .await
        .map_err(question_error)?;
    log::info!("User {} deleted question {}", user_id, question_id);

    Ok(HttpResponse::NoContent().finish())
}

/// GET /admin/events/{id}/attendees
#[get("/admin/events/{event_id}/attendees")]
pub async fn view_attendees(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    let event_id = path.into_inner();

    find_event(&db, event_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Event not found."))?;

    let attendees = attendees_with_answers(&db, event_id)
        .await
        .map_err(db_error)?;
    Ok(HttpResponse::Ok().json(attendees))
}

/// GET /admin/questions/{id}/summary.csv
#[get("/admin/questions/{question_id}/summary.csv")]
pub async fn download_summary(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let summary = answer_summary(&db, path.into_inner())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(summary.csv_filename())],
        })
        .body(summary.to_csv()))
}
