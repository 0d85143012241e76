mod common;

use common::database::setup_test_database;
use common::fixtures::{create_standard_form, create_test_event, create_test_user};
use efs_portal::forms::{build_form_schema, field_key, FieldKind, SubmittedForm};
use efs_portal::orm::attendee_answers;
use efs_portal::questions::{
    create_question, delete_question, list_questions, update_question, NewQuestion,
    QuestionChanges, QuestionError,
};
use efs_portal::registration::submit;
use sea_orm::{entity::*, query::*};

fn new_question(label: &str, field_type: &str, choices: &str) -> NewQuestion {
    NewQuestion {
        label: label.to_string(),
        field_type: field_type.to_string(),
        is_required: false,
        choices: choices.to_string(),
        display_order: None,
    }
}

#[actix_rt::test]
async fn test_create_appends_in_order() {
    let db = setup_test_database().await.unwrap();
    let event = create_test_event(&db, "Builder").await.unwrap();

    let first = create_question(&db, event.id, &new_question(" Company ", "text", ""))
        .await
        .unwrap();
    let second = create_question(
        &db,
        event.id,
        &new_question("T-shirt size", "dropdown", "S\r\n M \n\nL"),
    )
    .await
    .unwrap();

    assert_eq!(first.label, "Company");
    assert_eq!(first.display_order, 0);
    assert_eq!(second.display_order, 1);
    assert_eq!(second.choices, "S\nM\nL");

    let listed = list_questions(&db, event.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);

    let schema = build_form_schema(&db, event.id).await.unwrap();
    assert_eq!(schema.fields[1].kind, FieldKind::SingleSelect);
    assert_eq!(schema.fields[1].choices, vec!["S", "M", "L"]);
}

#[actix_rt::test]
async fn test_create_rejects_bad_input() {
    let db = setup_test_database().await.unwrap();
    let event = create_test_event(&db, "Strict").await.unwrap();

    let err = create_question(&db, event.id, &new_question("When", "date", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionError::UnknownKind(_)));

    let err = create_question(&db, event.id, &new_question("Size", "radio", "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionError::MissingChoices(_)));

    let err = create_question(&db, event.id, &new_question("Name", "text", "a\nb"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionError::UnexpectedChoices(_)));

    let err = create_question(&db, event.id, &new_question("", "text", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionError::Invalid(_)));

    let err = create_question(&db, 999, &new_question("Name", "text", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionError::EventNotFound(999)));

    assert!(list_questions(&db, event.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_update_changes_only_given_fields() {
    let db = setup_test_database().await.unwrap();
    let event = create_test_event(&db, "Editable").await.unwrap();
    let question = create_question(&db, event.id, &new_question("Diet", "dropdown", "A\nB"))
        .await
        .unwrap();

    let updated = update_question(
        &db,
        question.id,
        &QuestionChanges {
            is_required: Some(true),
            choices: Some("A\nB\nC".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.label, "Diet");
    assert!(updated.is_required);
    assert_eq!(updated.choices, "A\nB\nC");

    // Becoming a text field drops the choices.
    let updated = update_question(
        &db,
        question.id,
        &QuestionChanges {
            field_type: Some("textarea".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.field_type, "textarea");
    assert_eq!(updated.choices, "");

    // Becoming a select field needs choices.
    let err = update_question(
        &db,
        question.id,
        &QuestionChanges {
            field_type: Some("checkbox".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QuestionError::MissingChoices(_)));

    let err = update_question(&db, 4040, &QuestionChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionError::NotFound(4040)));
}

#[actix_rt::test]
async fn test_delete_removes_answers() {
    let db = setup_test_database().await.unwrap();
    let form = create_standard_form(&db).await.unwrap();
    let user = create_test_user(&db, "del@example.com").await.unwrap();

    let submitted = SubmittedForm::new()
        .with(field_key(form.company.id), "Acme")
        .with(field_key(form.diet.id), "Vegan");
    submit(&db, form.event.id, user.id, &submitted).await.unwrap();

    delete_question(&db, form.diet.id).await.unwrap();

    let remaining = attendee_answers::Entity::find()
        .filter(attendee_answers::Column::QuestionId.eq(form.diet.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(list_questions(&db, form.event.id).await.unwrap().len(), 2);

    assert!(matches!(
        delete_question(&db, form.diet.id).await,
        Err(QuestionError::NotFound(_))
    ));
}
