//! Organizer-side management of an event's custom questions.

use crate::constants::MAX_QUESTION_LABEL_LENGTH;
use crate::forms::{load_questions, parse_choices, FieldKind};
use crate::orm::{attendee_answers, event_questions, events};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationError};

#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("event {0} not found")]
    EventNotFound(i32),
    #[error("question {0} not found")]
    NotFound(i32),
    #[error("invalid question: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("unsupported field type {0:?}")]
    UnknownKind(String),
    #[error("{0} fields need at least one choice")]
    MissingChoices(&'static str),
    #[error("{0} fields do not take choices")]
    UnexpectedChoices(&'static str),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// A question to add to an event.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewQuestion {
    #[validate(custom = "validate_label")]
    pub label: String,
    /// Kind code, e.g. `dropdown`.
    pub field_type: String,
    #[serde(default)]
    pub is_required: bool,
    /// One choice per line.
    #[serde(default)]
    pub choices: String,
    /// Appended after the existing questions when absent.
    pub display_order: Option<i32>,
}

/// Partial update of a question. Absent fields keep their value.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct QuestionChanges {
    #[validate(custom = "validate_label")]
    pub label: Option<String>,
    pub field_type: Option<String>,
    pub is_required: Option<bool>,
    pub choices: Option<String>,
    pub display_order: Option<i32>,
}

fn validate_label(label: &str) -> Result<(), ValidationError> {
    let len = label.trim().chars().count() as u64;
    if len == 0 || len > MAX_QUESTION_LABEL_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(
            format!(
                "Label must be between 1 and {} characters.",
                MAX_QUESTION_LABEL_LENGTH
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Check that `code` names a kind and that `choices` fit it. Returns the
/// kind and the choices normalized to one trimmed choice per line.
fn check_kind_and_choices(code: &str, choices: &str) -> Result<(FieldKind, String), QuestionError> {
    let kind = FieldKind::from_code(code.trim())
        .ok_or_else(|| QuestionError::UnknownKind(code.to_string()))?;
    let choices = parse_choices(choices);

    if kind.has_choices() && choices.is_empty() {
        return Err(QuestionError::MissingChoices(kind.display_name()));
    }
    if !kind.has_choices() && !choices.is_empty() {
        return Err(QuestionError::UnexpectedChoices(kind.display_name()));
    }

    Ok((kind, choices.join("\n")))
}

pub async fn list_questions(
    db: &DatabaseConnection,
    event_id: i32,
) -> Result<Vec<event_questions::Model>, QuestionError> {
    events::Entity::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or(QuestionError::EventNotFound(event_id))?;
    Ok(load_questions(db, event_id).await?)
}

pub async fn create_question(
    db: &DatabaseConnection,
    event_id: i32,
    input: &NewQuestion,
) -> Result<event_questions::Model, QuestionError> {
    input.validate()?;
    let (kind, choices) = check_kind_and_choices(&input.field_type, &input.choices)?;

    events::Entity::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or(QuestionError::EventNotFound(event_id))?;

    let display_order = match input.display_order {
        Some(order) => order,
        None => next_display_order(db, event_id).await?,
    };

    let question = event_questions::ActiveModel {
        event_id: Set(event_id),
        label: Set(input.label.trim().to_string()),
        field_type: Set(kind.code().to_string()),
        is_required: Set(input.is_required),
        choices: Set(choices),
        display_order: Set(display_order),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!(
        "Added {} question {} to event {}",
        kind.code(),
        question.id,
        event_id
    );
    Ok(question)
}

async fn next_display_order(db: &DatabaseConnection, event_id: i32) -> Result<i32, DbErr> {
    let last = event_questions::Entity::find()
        .filter(event_questions::Column::EventId.eq(event_id))
        .order_by_desc(event_questions::Column::DisplayOrder)
        .one(db)
        .await?;
    Ok(last.map(|q| q.display_order + 1).unwrap_or(0))
}

pub async fn update_question(
    db: &DatabaseConnection,
    question_id: i32,
    changes: &QuestionChanges,
) -> Result<event_questions::Model, QuestionError> {
    changes.validate()?;

    let existing = event_questions::Entity::find_by_id(question_id)
        .one(db)
        .await?
        .ok_or(QuestionError::NotFound(question_id))?;

    let code = changes.field_type.as_deref().unwrap_or(&existing.field_type);
    let choices = match (&changes.choices, FieldKind::from_code(code.trim())) {
        (Some(choices), _) => choices.clone(),
        // Switching to a text kind drops the old choices.
        (None, Some(kind)) if !kind.has_choices() => String::new(),
        (None, _) => existing.choices.clone(),
    };
    let (kind, choices) = check_kind_and_choices(code, &choices)?;

    let mut question: event_questions::ActiveModel = existing.into();
    if let Some(label) = &changes.label {
        question.label = Set(label.trim().to_string());
    }
    if let Some(is_required) = changes.is_required {
        question.is_required = Set(is_required);
    }
    if let Some(order) = changes.display_order {
        question.display_order = Set(order);
    }
    question.field_type = Set(kind.code().to_string());
    question.choices = Set(choices);

    let question = question.update(db).await?;
    log::info!("Updated question {}", question.id);
    Ok(question)
}

/// Delete a question together with every answer given to it.
pub async fn delete_question(db: &DatabaseConnection, question_id: i32) -> Result<(), QuestionError> {
    let txn = db.begin().await?;

    let question = event_questions::Entity::find_by_id(question_id)
        .one(&txn)
        .await?
        .ok_or(QuestionError::NotFound(question_id))?;

    let answers = attendee_answers::Entity::delete_many()
        .filter(attendee_answers::Column::QuestionId.eq(question_id))
        .exec(&txn)
        .await?;
    event_questions::Entity::delete_many()
        .filter(event_questions::Column::Id.eq(question.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    log::info!(
        "Deleted question {} and {} answer(s)",
        question_id,
        answers.rows_affected
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_choices_are_normalized() {
        let (kind, choices) = check_kind_and_choices(" radio ", " Yes \r\n\r\nNo\n").unwrap();
        assert_eq!(kind, FieldKind::SingleSelectRadio);
        assert_eq!(choices, "Yes\nNo");
    }

    #[test]
    fn test_select_requires_choices() {
        assert!(matches!(
            check_kind_and_choices("checkbox", "  \n"),
            Err(QuestionError::MissingChoices(_))
        ));
    }

    #[test]
    fn test_text_rejects_choices() {
        assert!(matches!(
            check_kind_and_choices("text", "a\nb"),
            Err(QuestionError::UnexpectedChoices(_))
        ));
        assert!(check_kind_and_choices("textarea", "").is_ok());
    }

    #[test]
    fn test_unknown_kind() {
        assert!(matches!(
            check_kind_and_choices("date", ""),
            Err(QuestionError::UnknownKind(code)) if code == "date"
        ));
    }

    #[test]
    fn test_label_length() {
        let mut input = NewQuestion {
            label: "   ".to_string(),
            field_type: "text".to_string(),
            is_required: false,
            choices: String::new(),
            display_order: None,
        };
        assert!(input.validate().is_err());

        input.label = "x".repeat(256);
        assert!(input.validate().is_err());

        input.label = "Company".to_string();
        assert!(input.validate().is_ok());

        let changes = QuestionChanges {
            label: Some(String::new()),
            ..Default::default()
        };
        assert!(changes.validate().is_err());
        assert!(QuestionChanges::default().validate().is_ok());
    }
}
