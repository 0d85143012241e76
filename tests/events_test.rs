mod common;

use chrono::Duration;
use common::database::setup_test_database;
use common::fixtures::{create_event_at, create_standard_form, create_test_user, days_from_now};
use efs_portal::events::{
    attendee_count, dashboard, find_active_event, find_event, list_active_events, EventInfo,
    EventStatus,
};
use efs_portal::forms::{field_key, SubmittedForm};
use efs_portal::orm::events::{self, EventType};
use efs_portal::registration::submit;
use sea_orm::{entity::*, ActiveValue::Set};

#[actix_rt::test]
async fn test_active_listing_and_lookup() {
    let db = setup_test_database().await.unwrap();
    let older = create_event_at(&db, "Older", days_from_now(2), None, true)
        .await
        .unwrap();
    let newer = create_event_at(&db, "Newer", days_from_now(9), None, true)
        .await
        .unwrap();
    let hidden = create_event_at(&db, "Hidden", days_from_now(5), None, false)
        .await
        .unwrap();

    let listed: Vec<i32> = list_active_events(&db)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(listed, vec![newer.id, older.id]);

    assert!(find_event(&db, hidden.id).await.unwrap().is_some());
    assert!(find_active_event(&db, hidden.id).await.unwrap().is_none());
    assert!(find_active_event(&db, older.id).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_event_type_and_location_are_stored() {
    let db = setup_test_database().await.unwrap();
    let event = create_event_at(&db, "Meetup", days_from_now(3), None, true)
        .await
        .unwrap();

    let mut active: events::ActiveModel = event.into();
    active.event_type = Set(EventType::Online);
    active.physical_location = Set(String::new());
    active.online_link = Set("https://meet.example.com/rust".to_string());
    let event = active.update(&db).await.unwrap();

    let found = find_event(&db, event.id).await.unwrap().unwrap();
    assert_eq!(found.event_type, EventType::Online);
    assert_eq!(found.online_link, "https://meet.example.com/rust");

    let info = EventInfo::new(&found, days_from_now(0), "http://localhost:8080");
    assert_eq!(info.event_type_display, "Online");
    assert_eq!(info.physical_location, "");
}

#[actix_rt::test]
async fn test_dashboard_split() {
    let db = setup_test_database().await.unwrap();
    let now = days_from_now(0);

    let ongoing = create_event_at(
        &db,
        "Ongoing",
        now - Duration::hours(1),
        Some(now + Duration::hours(1)),
        true,
    )
    .await
    .unwrap();
    let upcoming = create_event_at(&db, "Upcoming", now + Duration::days(1), None, true)
        .await
        .unwrap();
    create_event_at(
        &db,
        "Past",
        now - Duration::days(3),
        Some(now - Duration::days(2)),
        true,
    )
    .await
    .unwrap();
    create_event_at(&db, "Hidden", now + Duration::days(1), None, false)
        .await
        .unwrap();

    let board = dashboard(&db, now).await.unwrap();
    let ongoing_ids: Vec<i32> = board.ongoing.iter().map(|e| e.id).collect();
    let upcoming_ids: Vec<i32> = board.upcoming.iter().map(|e| e.id).collect();
    assert_eq!(ongoing_ids, vec![ongoing.id]);
    assert_eq!(upcoming_ids, vec![upcoming.id]);

    let info = EventInfo::new(&board.ongoing[0], now, "http://localhost:8080");
    assert_eq!(info.event_status, EventStatus::Ongoing);
    assert!(!info.is_past);
}

#[actix_rt::test]
async fn test_attendee_count() {
    let db = setup_test_database().await.unwrap();
    let form = create_standard_form(&db).await.unwrap();
    assert_eq!(attendee_count(&db, form.event.id).await.unwrap(), 0);

    for email in ["a@example.com", "b@example.com"] {
        let user = create_test_user(&db, email).await.unwrap();
        let submitted = SubmittedForm::new()
            .with(field_key(form.company.id), "Acme")
            .with(field_key(form.diet.id), "None");
        submit(&db, form.event.id, user.id, &submitted).await.unwrap();
    }

    assert_eq!(attendee_count(&db, form.event.id).await.unwrap(), 2);
}
