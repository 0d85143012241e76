//! Submitted form data and its validation against a [`FormSchema`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::kind::{AnswerValue, FieldKind};
use super::schema::{is_field_key, FormSchema};

/// Raw values posted for a form, keyed by field key. A key may carry several
/// values (checkbox groups post one pair per ticked box).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmittedForm {
    values: BTreeMap<String, Vec<String>>,
}

impl SubmittedForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `application/x-www-form-urlencoded` pairs by key, keeping order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::new();
        for (key, value) in pairs {
            form.push(key, value);
        }
        form
    }

    /// Append one value under `key`.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn get(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// One field's validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn required() -> Self {
        Self::new("required", "This field is required.")
    }

    pub fn invalid_choice(value: &str) -> Self {
        Self::new(
            "invalid_choice",
            format!(
                "Select a valid choice. {} is not one of the available choices.",
                value
            ),
        )
    }

    pub fn too_many_values() -> Self {
        Self::new("too_many_values", "Only one value may be submitted.")
    }
}

/// Every failing field of a submission, by field key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, error: FieldError) {
        self.0.insert(key.into(), error);
    }

    pub fn get(&self, key: &str) -> Option<&FieldError> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.0.len())?;
        for (key, error) in &self.0 {
            write!(f, "; {}: {}", key, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A field that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedField {
    pub key: String,
    pub question_id: i32,
    pub kind: FieldKind,
    pub value: AnswerValue,
}

/// Validate `form` against every field of `schema`.
///
/// Returns one validated field per schema field, in schema order, or every
/// failure at once. Keys the schema does not know are not looked at here; see
/// [`unknown_question_keys`].
pub fn validate(
    schema: &FormSchema,
    form: &SubmittedForm,
) -> Result<Vec<ValidatedField>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut fields = Vec::with_capacity(schema.fields.len());

    for field in &schema.fields {
        match field
            .kind
            .validate(field.required, &field.choices, form.get(&field.key))
        {
            Ok(value) => fields.push(ValidatedField {
                key: field.key.clone(),
                question_id: field.question_id,
                kind: field.kind,
                value,
            }),
            Err(error) => errors.add(field.key.clone(), error),
        }
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

/// Submitted keys that look like question keys but name no field of `schema`.
/// A non-empty result means the client rendered a stale form.
pub fn unknown_question_keys(schema: &FormSchema, form: &SubmittedForm) -> Vec<String> {
    form.keys()
        .filter(|key| is_field_key(key) && schema.field(key).is_none())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::FieldDescriptor;

    fn schema() -> FormSchema {
        FormSchema {
            event_id: 1,
            fields: vec![
                FieldDescriptor {
                    key: "custom_question_1".to_string(),
                    question_id: 1,
                    label: "Company".to_string(),
                    kind: FieldKind::SingleLineText,
                    required: true,
                    choices: vec![],
                },
                FieldDescriptor {
                    key: "custom_question_2".to_string(),
                    question_id: 2,
                    label: "Topics".to_string(),
                    kind: FieldKind::MultiSelect,
                    required: false,
                    choices: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_from_pairs_groups_repeated_keys() {
        let form = SubmittedForm::from_pairs(vec![
            ("custom_question_2".to_string(), "A".to_string()),
            ("csrf_token".to_string(), "abc".to_string()),
            ("custom_question_2".to_string(), "C".to_string()),
        ]);
        assert_eq!(form.get("custom_question_2"), &["A".to_string(), "C".to_string()]);
        assert_eq!(form.get("csrf_token"), &["abc".to_string()]);
        assert!(form.get("missing").is_empty());
    }

    #[test]
    fn test_validate_collects_every_field() {
        let form = SubmittedForm::new()
            .with("custom_question_1", "Acme")
            .with("custom_question_2", "C")
            .with("custom_question_2", "A");
        let fields = validate(&schema(), &form).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value.encode(), "Acme");
        assert_eq!(fields[1].value.encode(), "A, C");
    }

    #[test]
    fn test_validate_reports_by_key() {
        let form = SubmittedForm::new().with("custom_question_2", "Z");
        let errors = validate(&schema(), &form).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("custom_question_1").unwrap().code, "required");
        assert_eq!(errors.get("custom_question_2").unwrap().code, "invalid_choice");
        assert!(errors.to_string().starts_with("2 field(s) failed validation"));
    }

    #[test]
    fn test_unknown_question_keys_ignores_other_fields() {
        let form = SubmittedForm::new()
            .with("custom_question_1", "Acme")
            .with("custom_question_99", "stale")
            .with("csrf_token", "abc");
        assert_eq!(
            unknown_question_keys(&schema(), &form),
            vec!["custom_question_99".to_string()]
        );
    }
}
