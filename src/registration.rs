//! Signup submission: validation and the all-or-nothing registration write.
//!
//! A submission either commits one attendee row plus one answer row per form
//! field, or leaves no trace. The unique index on (user_id, event_id) is what
//! makes the duplicate check safe against concurrent submissions; the lookup
//! at the start of the transaction only saves a failed insert in the common
//! case.

use crate::email::templates::Confirmation;
use crate::events::{find_active_event, EventStatus};
use crate::forms::{
    load_questions, schema_from_questions, unknown_question_keys, validate, ConfigIssue,
    FormError, SubmittedForm, ValidatedField, ValidationErrors,
};
use crate::notify::{Notifier, NotifyError};
use crate::orm::{attendee_answers, attendees, event_questions, events, users};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseConnection, DatabaseTransaction, DbErr};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Successful outcome of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// A new registration was committed; carries the attendee id.
    Registered(i32),
    /// The user was already registered; nothing was written.
    AlreadyRegistered(i32),
}

impl Submission {
    pub fn attendee_id(&self) -> i32 {
        match self {
            Submission::Registered(id) | Submission::AlreadyRegistered(id) => *id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Submission::Registered(_))
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("event {0} not found")]
    EventNotFound(i32),
    #[error("event {0} is closed for registration")]
    EventClosed(i32),
    #[error("submission rejected: {0}")]
    Validation(ValidationErrors),
    #[error("event {event_id} has misconfigured questions: {issues:?}")]
    Misconfigured {
        event_id: i32,
        issues: Vec<ConfigIssue>,
    },
    #[error("field {key} does not match a question of event {event_id}")]
    ConfigurationInconsistency { event_id: i32, key: String },
    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
}

impl RegistrationError {
    /// Failures the submitter cannot fix by editing the form. These are shown
    /// as a generic error; nothing was persisted, so a retry is safe.
    pub fn is_generic_failure(&self) -> bool {
        matches!(
            self,
            RegistrationError::Misconfigured { .. }
                | RegistrationError::ConfigurationInconsistency { .. }
                | RegistrationError::Storage(_)
        )
    }
}

impl From<FormError> for RegistrationError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::EventNotFound(event_id) => RegistrationError::EventNotFound(event_id),
            FormError::Misconfigured { event_id, issues } => {
                RegistrationError::Misconfigured { event_id, issues }
            }
            FormError::Db(err) => RegistrationError::Storage(err),
        }
    }
}

/// Validate and persist a signup of `user_id` for `event_id`.
pub async fn submit(
    db: &DatabaseConnection,
    event_id: i32,
    user_id: i32,
    form: &SubmittedForm,
) -> Result<Submission, RegistrationError> {
    let now = Utc::now().naive_utc();

    let event = find_active_event(db, event_id)
        .await?
        .ok_or(RegistrationError::EventNotFound(event_id))?;
    if EventStatus::of(&event, now) == EventStatus::Past {
        return Err(RegistrationError::EventClosed(event_id));
    }

    let questions = load_questions(db, event_id).await?;
    let schema = schema_from_questions(event_id, &questions)?;

    if let Some(key) = unknown_question_keys(&schema, form).into_iter().next() {
        log::warn!(
            "Rejected signup of user {} for event {}: stale field {}",
            user_id,
            event_id,
            key
        );
        return Err(RegistrationError::ConfigurationInconsistency { event_id, key });
    }

    let fields = validate(&schema, form).map_err(RegistrationError::Validation)?;

    save_registration(db, event_id, user_id, &fields).await
}

/// Why the write unit stopped. Decided on after the rollback.
enum WriteFailure {
    AttendeeInsert(DbErr),
    StaleQuestion(String),
    Db(DbErr),
}

impl From<DbErr> for WriteFailure {
    fn from(err: DbErr) -> Self {
        WriteFailure::Db(err)
    }
}

/// Write an already validated submission as one unit.
///
/// Every field's question must still belong to the event when the answer is
/// written; otherwise nothing is kept.
pub async fn save_registration(
    db: &DatabaseConnection,
    event_id: i32,
    user_id: i32,
    fields: &[ValidatedField],
) -> Result<Submission, RegistrationError> {
    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;
    let outcome = write_registration(&txn, event_id, user_id, fields, now).await;

    match outcome {
        Ok(Submission::Registered(attendee_id)) => {
            txn.commit().await?;
            log::info!(
                "User {} registered for event {} (attendee {}, {} answers)",
                user_id,
                event_id,
                attendee_id,
                fields.len()
            );
            Ok(Submission::Registered(attendee_id))
        }
        Ok(already) => {
            txn.rollback().await?;
            log::debug!("User {} already registered for event {}", user_id, event_id);
            Ok(already)
        }
        Err(failure) => {
            if let Err(e) = txn.rollback().await {
                log::error!("Rollback of registration for event {} failed: {}", event_id, e);
            }
            match failure {
                WriteFailure::AttendeeInsert(err) => {
                    settle_attendee_insert_failure(db, event_id, user_id, err).await
                }
                WriteFailure::StaleQuestion(key) => {
                    log::warn!(
                        "Question behind {} disappeared during signup for event {}",
                        key,
                        event_id
                    );
                    Err(RegistrationError::ConfigurationInconsistency { event_id, key })
                }
                WriteFailure::Db(err) => Err(RegistrationError::Storage(err)),
            }
        }
    }
}

/// A rejected attendee insert means a concurrent submission of the same user
/// committed first, unless no registration exists now.
async fn settle_attendee_insert_failure(
    db: &DatabaseConnection,
    event_id: i32,
    user_id: i32,
    err: DbErr,
) -> Result<Submission, RegistrationError> {
    match registration_for(db, user_id, event_id).await? {
        Some(existing) => {
            log::debug!(
                "User {} lost a signup race for event {}: {}",
                user_id,
                event_id,
                err
            );
            Ok(Submission::AlreadyRegistered(existing.id))
        }
        None => Err(RegistrationError::Storage(err)),
    }
}

async fn write_registration(
    txn: &DatabaseTransaction,
    event_id: i32,
    user_id: i32,
    fields: &[ValidatedField],
    now: NaiveDateTime,
) -> Result<Submission, WriteFailure> {
    let existing = attendees::Entity::find()
        .filter(attendees::Column::UserId.eq(user_id))
        .filter(attendees::Column::EventId.eq(event_id))
        .one(txn)
        .await?;
    if let Some(existing) = existing {
        return Ok(Submission::AlreadyRegistered(existing.id));
    }

    let attendee = attendees::ActiveModel {
        user_id: Set(user_id),
        event_id: Set(event_id),
        registration_date: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(WriteFailure::AttendeeInsert)?;

    for field in fields {
        let question = event_questions::Entity::find_by_id(field.question_id)
            .filter(event_questions::Column::EventId.eq(event_id))
            .one(txn)
            .await?;
        if question.is_none() {
            return Err(WriteFailure::StaleQuestion(field.key.clone()));
        }

        attendee_answers::ActiveModel {
            attendee_id: Set(attendee.id),
            question_id: Set(field.question_id),
            answer: Set(field.value.encode()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    Ok(Submission::Registered(attendee.id))
}

/// What [`register_and_notify`] did. The two outcomes are independent.
#[derive(Debug)]
pub struct RegistrationReport {
    pub submission: Submission,
    /// `None` when no notification was attempted (nothing new was committed).
    pub notification: Option<Result<(), NotifyError>>,
}

impl RegistrationReport {
    pub fn notified(&self) -> bool {
        matches!(self.notification, Some(Ok(())))
    }
}

/// [`submit`], then confirm a new registration through `notifier`.
///
/// A notification failure is logged and reported; the registration stays.
pub async fn register_and_notify(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    event_id: i32,
    user_id: i32,
    form: &SubmittedForm,
) -> Result<RegistrationReport, RegistrationError> {
    let submission = submit(db, event_id, user_id, form).await?;
    if !submission.is_new() {
        return Ok(RegistrationReport {
            submission,
            notification: None,
        });
    }

    let notification = match confirmation_for(db, submission.attendee_id()).await {
        Ok(confirmation) => notifier.registration_confirmed(&confirmation).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &notification {
        log::error!(
            "Registration {} committed but confirmation failed: {}",
            submission.attendee_id(),
            e
        );
    }

    Ok(RegistrationReport {
        submission,
        notification: Some(notification),
    })
}

/// Everything the confirmation message needs about a committed registration.
pub async fn confirmation_for(
    db: &DatabaseConnection,
    attendee_id: i32,
) -> Result<Confirmation, NotifyError> {
    let attendee = attendees::Entity::find_by_id(attendee_id)
        .one(db)
        .await?
        .ok_or(NotifyError::MissingRegistration(attendee_id))?;
    let user = users::Entity::find_by_id(attendee.user_id)
        .one(db)
        .await?
        .ok_or(NotifyError::MissingRegistration(attendee_id))?;
    let event = events::Entity::find_by_id(attendee.event_id)
        .one(db)
        .await?
        .ok_or(NotifyError::MissingRegistration(attendee_id))?;

    Ok(Confirmation {
        attendee_id,
        email: user.email.clone(),
        full_name: user.full_name(),
        event_id: event.id,
        event_name: event.name,
        event_start: event.start_datetime,
    })
}

/// The registration of `user_id` for `event_id`, if any.
pub async fn registration_for(
    db: &DatabaseConnection,
    user_id: i32,
    event_id: i32,
) -> Result<Option<attendees::Model>, DbErr> {
    attendees::Entity::find()
        .filter(attendees::Column::UserId.eq(user_id))
        .filter(attendees::Column::EventId.eq(event_id))
        .one(db)
        .await
}

/// One stored answer with the question it answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerRow {
    pub question_id: i32,
    pub label: String,
    pub answer: String,
    #[serde(skip)]
    display_order: i32,
}

/// An attendee of an event with their answers, for organizers.
#[derive(Clone, Debug, Serialize)]
pub struct AttendeeRecord {
    pub attendee_id: i32,
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
    pub registration_date: NaiveDateTime,
    pub answers: Vec<AnswerRow>,
}

/// Answers of one attendee, in form order.
pub async fn answers_for(db: &DatabaseConnection, attendee_id: i32) -> Result<Vec<AnswerRow>, DbErr> {
    let mut grouped = load_answers(db, vec![attendee_id]).await?;
    Ok(grouped.remove(&attendee_id).unwrap_or_default())
}

/// Every attendee of `event_id`, most recent registration first.
pub async fn attendees_with_answers(
    db: &DatabaseConnection,
    event_id: i32,
) -> Result<Vec<AttendeeRecord>, DbErr> {
    let rows = attendees::Entity::find()
        .filter(attendees::Column::EventId.eq(event_id))
        .order_by_desc(attendees::Column::RegistrationDate)
        .order_by_desc(attendees::Column::Id)
        .find_also_related(users::Entity)
        .all(db)
        .await?;

    let ids = rows.iter().map(|(attendee, _)| attendee.id).collect();
    let mut answers = load_answers(db, ids).await?;

    Ok(rows
        .into_iter()
        .map(|(attendee, user)| {
            let (email, full_name) = match user {
                Some(user) => (user.email.clone(), user.full_name()),
                None => (String::new(), String::new()),
            };
            AttendeeRecord {
                attendee_id: attendee.id,
                user_id: attendee.user_id,
                email,
                full_name,
                registration_date: attendee.registration_date,
                answers: answers.remove(&attendee.id).unwrap_or_default(),
            }
        })
        .collect())
}

async fn load_answers(
    db: &DatabaseConnection,
    attendee_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<AnswerRow>>, DbErr> {
    let mut grouped: HashMap<i32, Vec<AnswerRow>> = HashMap::new();
    if attendee_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = attendee_answers::Entity::find()
        .filter(attendee_answers::Column::AttendeeId.is_in(attendee_ids))
        .find_also_related(event_questions::Entity)
        .all(db)
        .await?;

    for (answer, question) in rows {
        let (label, display_order) = match question {
            Some(question) => (question.label, question.display_order),
            None => (String::new(), i32::MAX),
        };
        grouped.entry(answer.attendee_id).or_default().push(AnswerRow {
            question_id: answer.question_id,
            label,
            answer: answer.answer,
            display_order,
        });
    }

    for answers in grouped.values_mut() {
        answers.sort_by_key(|row| (row.display_order, row.question_id));
    }

    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, create_schema};

    async fn user_and_event(db: &DatabaseConnection) -> (users::Model, events::Model) {
        let now = Utc::now().naive_utc();
        let user = users::ActiveModel {
            email: Set("racer@example.com".to_string()),
            first_name: Set("Race".to_string()),
            last_name: Set("Runner".to_string()),
            is_active: Set(true),
            is_staff: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        let event = events::ActiveModel {
            name: Set("Relay".to_string()),
            description: Set(String::new()),
            start_datetime: Set(now),
            end_datetime: Set(None),
            event_type: Set(events::EventType::Physical),
            physical_location: Set(String::new()),
            online_link: Set(String::new()),
            is_active: Set(true),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        (user, event)
    }

    #[actix_rt::test]
    async fn test_rejected_insert_after_concurrent_commit_is_already_registered() {
        let db = connect("sqlite::memory:", 1).await.unwrap();
        create_schema(&db).await.unwrap();
        let (user, event) = user_and_event(&db).await;

        let winner = save_registration(&db, event.id, user.id, &[]).await.unwrap();
        assert!(winner.is_new());

        let err = DbErr::Exec("UNIQUE constraint failed: attendees.user_id, attendees.event_id".into());
        let loser = settle_attendee_insert_failure(&db, event.id, user.id, err)
            .await
            .unwrap();
        assert_eq!(loser, Submission::AlreadyRegistered(winner.attendee_id()));
    }

    #[actix_rt::test]
    async fn test_rejected_insert_without_registration_is_storage_error() {
        let db = connect("sqlite::memory:", 1).await.unwrap();
        create_schema(&db).await.unwrap();
        let (user, event) = user_and_event(&db).await;

        let err = DbErr::Exec("FOREIGN KEY constraint failed".into());
        let result = settle_attendee_insert_failure(&db, event.id, user.id, err).await;
        assert!(matches!(result, Err(RegistrationError::Storage(_))));
        assert!(registration_for(&db, user.id, event.id).await.unwrap().is_none());
    }

    #[test]
    fn test_submission_accessors() {
        assert_eq!(Submission::Registered(3).attendee_id(), 3);
        assert!(Submission::Registered(3).is_new());
        assert_eq!(Submission::AlreadyRegistered(8).attendee_id(), 8);
        assert!(!Submission::AlreadyRegistered(8).is_new());
    }

    #[test]
    fn test_generic_failures() {
        assert!(RegistrationError::Storage(DbErr::Custom("down".into())).is_generic_failure());
        assert!(RegistrationError::ConfigurationInconsistency {
            event_id: 1,
            key: "custom_question_9".into()
        }
        .is_generic_failure());
        assert!(!RegistrationError::Validation(ValidationErrors::new()).is_generic_failure());
        assert!(!RegistrationError::EventNotFound(1).is_generic_failure());
    }

    #[test]
    fn test_form_errors_map_onto_registration_errors() {
        let err: RegistrationError = FormError::EventNotFound(4).into();
        assert!(matches!(err, RegistrationError::EventNotFound(4)));

        let err: RegistrationError = FormError::Misconfigured {
            event_id: 4,
            issues: vec![],
        }
        .into();
        assert!(matches!(err, RegistrationError::Misconfigured { event_id: 4, .. }));
    }
}
