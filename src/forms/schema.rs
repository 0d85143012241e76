//! Builds the form schema of an event from its stored questions.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::kind::FieldKind;
use crate::constants::CUSTOM_QUESTION_PREFIX;
use crate::orm::{event_questions, events};

static FIELD_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}[0-9]+$", CUSTOM_QUESTION_PREFIX))
        .expect("field key pattern is a valid regex")
});

/// Stable form key of a question.
pub fn field_key(question_id: i32) -> String {
    format!("{}{}", CUSTOM_QUESTION_PREFIX, question_id)
}

/// Whether `key` has the shape of a question key. Ids too large for any
/// stored question still count.
pub fn is_field_key(key: &str) -> bool {
    FIELD_KEY.is_match(key)
}

/// Split stored choices text into choices: one per line, trimmed, blank lines
/// dropped.
pub fn parse_choices(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// One renderable, validatable field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub key: String,
    #[serde(skip)]
    pub question_id: i32,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub choices: Vec<String>,
}

/// Ordered fields of one event's signup form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormSchema {
    pub event_id: i32,
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// A stored question that cannot become a usable form field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ConfigIssue {
    UnsupportedKind { question_id: i32, code: String },
    NoChoices { question_id: i32, label: String },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::UnsupportedKind { question_id, code } => write!(
                f,
                "question {} has unsupported field type {:?}",
                question_id, code
            ),
            ConfigIssue::NoChoices { question_id, label } => write!(
                f,
                "question {} ({:?}) is a select field without choices",
                question_id, label
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("event {0} not found")]
    EventNotFound(i32),
    #[error("event {event_id} has {} misconfigured question(s): {}", .issues.len(), join_issues(.issues))]
    Misconfigured {
        event_id: i32,
        issues: Vec<ConfigIssue>,
    },
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load the questions of `event_id` in form order: display order, then
/// insertion order.
pub async fn load_questions(
    db: &DatabaseConnection,
    event_id: i32,
) -> Result<Vec<event_questions::Model>, DbErr> {
    event_questions::Entity::find()
        .filter(event_questions::Column::EventId.eq(event_id))
        .order_by_asc(event_questions::Column::DisplayOrder)
        .order_by_asc(event_questions::Column::Id)
        .all(db)
        .await
}

/// Build the form schema of an event.
///
/// Fails when the event is missing or when any of its questions cannot be
/// turned into a usable field.
pub async fn build_form_schema(
    db: &DatabaseConnection,
    event_id: i32,
) -> Result<FormSchema, FormError> {
    events::Entity::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or(FormError::EventNotFound(event_id))?;

    let questions = load_questions(db, event_id).await?;
    schema_from_questions(event_id, &questions)
}

/// Turn already-ordered questions into a schema.
pub fn schema_from_questions(
    event_id: i32,
    questions: &[event_questions::Model],
) -> Result<FormSchema, FormError> {
    let mut fields = Vec::with_capacity(questions.len());
    let mut issues = Vec::new();

    for question in questions {
        match describe_question(question) {
            Ok(field) => fields.push(field),
            Err(issue) => issues.push(issue),
        }
    }

    if !issues.is_empty() {
        return Err(FormError::Misconfigured { event_id, issues });
    }

    Ok(FormSchema { event_id, fields })
}

/// Describe a single question as a field.
pub fn describe_question(question: &event_questions::Model) -> Result<FieldDescriptor, ConfigIssue> {
    let kind = FieldKind::from_code(&question.field_type).ok_or_else(|| {
        ConfigIssue::UnsupportedKind {
            question_id: question.id,
            code: question.field_type.clone(),
        }
    })?;

    let choices = if kind.has_choices() {
        let choices = parse_choices(&question.choices);
        if choices.is_empty() {
            return Err(ConfigIssue::NoChoices {
                question_id: question.id,
                label: question.label.clone(),
            });
        }
        choices
    } else {
        Vec::new()
    };

    Ok(FieldDescriptor {
        key: field_key(question.id),
        question_id: question.id,
        label: question.label.clone(),
        kind,
        required: question.is_required,
        choices,
    })
}
