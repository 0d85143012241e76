//! Dynamic signup forms.
//!
//! An event's questions become a [`FormSchema`]: ordered field descriptors
//! that the web layer renders and [`validate`] checks submissions against.
//! Per-kind behavior lives in [`FieldKind`].

pub mod kind;
pub mod schema;
pub mod validate;

pub use kind::{AnswerValue, FieldKind, ValueShape};
pub use schema::{
    build_form_schema, describe_question, field_key, load_questions, parse_choices,
    is_field_key, schema_from_questions, ConfigIssue, FieldDescriptor, FormError, FormSchema,
};
pub use validate::{
    unknown_question_keys, validate, FieldError, SubmittedForm, ValidatedField, ValidationErrors,
};
