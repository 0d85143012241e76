//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use chrono::{Duration, NaiveDateTime, Utc};
use efs_portal::orm::events::EventType;
use efs_portal::orm::{event_questions, events, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Now shifted by `days` (negative for the past).
pub fn days_from_now(days: i64) -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::days(days)
}

/// Create an active, non-staff user
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        email: Set(email.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        is_active: Set(true),
        is_staff: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create an active organizer account
pub async fn create_staff_user(db: &DatabaseConnection, email: &str) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        email: Set(email.to_string()),
        first_name: Set("Event".to_string()),
        last_name: Set("Organizer".to_string()),
        is_active: Set(true),
        is_staff: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create an event with explicit times and visibility
pub async fn create_event_at(
    db: &DatabaseConnection,
    name: &str,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    is_active: bool,
) -> Result<events::Model, DbErr> {
    events::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("All about {}", name)),
        start_datetime: Set(start),
        end_datetime: Set(end),
        event_type: Set(EventType::Physical),
        physical_location: Set("Main Hall".to_string()),
        online_link: Set(String::new()),
        is_active: Set(is_active),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create an active event starting in a week
pub async fn create_test_event(db: &DatabaseConnection, name: &str) -> Result<events::Model, DbErr> {
    create_event_at(
        db,
        name,
        days_from_now(7),
        Some(days_from_now(7) + Duration::hours(8)),
        true,
    )
    .await
}

/// Insert a question row directly, bypassing input checks
pub async fn create_test_question(
    db: &DatabaseConnection,
    event_id: i32,
    label: &str,
    field_type: &str,
    is_required: bool,
    choices: &[&str],
    display_order: i32,
) -> Result<event_questions::Model, DbErr> {
    event_questions::ActiveModel {
        event_id: Set(event_id),
        label: Set(label.to_string()),
        field_type: Set(field_type.to_string()),
        is_required: Set(is_required),
        choices: Set(choices.join("\n")),
        display_order: Set(display_order),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// The three-question form used across the registration tests:
/// required company (text), required diet (dropdown), optional topics (checkbox).
pub struct StandardForm {
    pub event: events::Model,
    pub company: event_questions::Model,
    pub diet: event_questions::Model,
    pub topics: event_questions::Model,
}

pub async fn create_standard_form(db: &DatabaseConnection) -> Result<StandardForm, DbErr> {
    let event = create_test_event(db, "RustConf").await?;
    let company = create_test_question(db, event.id, "Company", "text", true, &[], 0).await?;
    let diet = create_test_question(
        db,
        event.id,
        "Dietary preference",
        "dropdown",
        true,
        &["Vegetarian", "Vegan", "None"],
        1,
    )
    .await?;
    let topics = create_test_question(
        db,
        event.id,
        "Topics",
        "checkbox",
        false,
        &["Async", "Embedded", "Web"],
        2,
    )
    .await?;

    Ok(StandardForm {
        event,
        company,
        diet,
        topics,
    })
}
