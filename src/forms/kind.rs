//! Field kinds and their per-kind rules.
//!
//! Every behavior that depends on the kind of a question (stored code, value
//! shape, widget, validation, encoding) is decided here and nowhere else.

use serde::{Deserialize, Serialize};

use super::validate::FieldError;
use crate::constants::MULTI_VALUE_SEPARATOR;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    SingleLineText,
    MultiLineText,
    SingleSelect,
    SingleSelectRadio,
    MultiSelect,
}

/// What a submitted value looks like for a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    /// One free-form string.
    FreeText,
    /// One string out of the declared choices.
    OneOf,
    /// Any subset of the declared choices.
    ManyOf,
}

/// A validated answer, ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choice(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    /// Text form persisted in `attendee_answers.answer`.
    ///
    /// Multiple selections are joined with `", "`. A choice that itself
    /// contains the separator cannot be told apart after joining.
    pub fn encode(&self) -> String {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => text.clone(),
            AnswerValue::Choices(choices) => choices.join(MULTI_VALUE_SEPARATOR),
        }
    }
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::SingleLineText,
        FieldKind::MultiLineText,
        FieldKind::SingleSelect,
        FieldKind::SingleSelectRadio,
        FieldKind::MultiSelect,
    ];

    /// Parse the code stored in `event_questions.field_type`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "text" => Some(FieldKind::SingleLineText),
            "textarea" => Some(FieldKind::MultiLineText),
            "dropdown" => Some(FieldKind::SingleSelect),
            "radio" => Some(FieldKind::SingleSelectRadio),
            "checkbox" => Some(FieldKind::MultiSelect),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FieldKind::SingleLineText => "text",
            FieldKind::MultiLineText => "textarea",
            FieldKind::SingleSelect => "dropdown",
            FieldKind::SingleSelectRadio => "radio",
            FieldKind::MultiSelect => "checkbox",
        }
    }

    /// Label shown to organizers when picking a kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldKind::SingleLineText => "Text (Single Line)",
            FieldKind::MultiLineText => "Text (Multi-Line)",
            FieldKind::SingleSelect => "Dropdown",
            FieldKind::SingleSelectRadio => "Radio Buttons",
            FieldKind::MultiSelect => "Checkboxes (Multiple Answers)",
        }
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            FieldKind::SingleLineText | FieldKind::MultiLineText => ValueShape::FreeText,
            FieldKind::SingleSelect | FieldKind::SingleSelectRadio => ValueShape::OneOf,
            FieldKind::MultiSelect => ValueShape::ManyOf,
        }
    }

    /// Whether the kind draws its values from a list of choices.
    pub fn has_choices(&self) -> bool {
        self.shape() != ValueShape::FreeText
    }

    /// HTML control used to render the field.
    pub fn widget(&self) -> &'static str {
        match self {
            FieldKind::SingleLineText => "text",
            FieldKind::MultiLineText => "textarea",
            FieldKind::SingleSelect => "select",
            FieldKind::SingleSelectRadio => "radio",
            FieldKind::MultiSelect => "checkbox",
        }
    }

    /// Check raw submitted values against this kind and turn them into an
    /// [`AnswerValue`]. `raw` is empty when the field was not submitted.
    pub fn validate(
        &self,
        required: bool,
        choices: &[String],
        raw: &[String],
    ) -> Result<AnswerValue, FieldError> {
        match self.shape() {
            ValueShape::FreeText => {
                let text = single_value(raw)?;
                if required && text.is_empty() {
                    return Err(FieldError::required());
                }
                Ok(AnswerValue::Text(text))
            }
            ValueShape::OneOf => {
                let choice = single_value(raw)?;
                if choice.is_empty() {
                    if required {
                        return Err(FieldError::required());
                    }
                    return Ok(AnswerValue::Choice(choice));
                }
                if !choices.contains(&choice) {
                    return Err(FieldError::invalid_choice(&choice));
                }
                Ok(AnswerValue::Choice(choice))
            }
            ValueShape::ManyOf => {
                let selected: Vec<&str> = raw
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .collect();
                if selected.is_empty() && required {
                    return Err(FieldError::required());
                }
                if let Some(bad) = selected
                    .iter()
                    .find(|value| !choices.iter().any(|choice| choice == *value))
                {
                    return Err(FieldError::invalid_choice(bad));
                }
                // Declared order, each choice at most once.
                Ok(AnswerValue::Choices(
                    choices
                        .iter()
                        .filter(|choice| selected.contains(&choice.as_str()))
                        .cloned()
                        .collect(),
                ))
            }
        }
    }
}

/// At most one value, trimmed. Missing becomes the empty string.
fn single_value(raw: &[String]) -> Result<String, FieldError> {
    match raw {
        [] => Ok(String::new()),
        [value] => Ok(value.trim().to_string()),
        _ => Err(FieldError::too_many_values()),
    }
}
