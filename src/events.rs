//! Event catalog: lookups, status and dashboard listings.

use crate::orm::events::EventType;
use crate::orm::{attendees, events};
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Serialize;

/// Where an event sits relative to a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EventStatus {
    Past,
    Ongoing,
    Upcoming,
}

impl EventStatus {
    /// Past once the end time has gone by, Upcoming before the start time,
    /// Ongoing otherwise. Events without an end time never become Past.
    pub fn of(event: &events::Model, now: NaiveDateTime) -> Self {
        if let Some(end) = event.end_datetime {
            if end < now {
                return EventStatus::Past;
            }
        }
        if event.start_datetime > now {
            EventStatus::Upcoming
        } else {
            EventStatus::Ongoing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Past => "Past",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Upcoming => "Upcoming",
        }
    }
}

/// Public view of an event.
#[derive(Clone, Debug, Serialize)]
pub struct EventInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: Option<NaiveDateTime>,
    pub event_type: EventType,
    pub event_type_display: &'static str,
    pub physical_location: String,
    pub online_link: String,
    pub event_status: EventStatus,
    pub is_past: bool,
    pub event_detail_url: String,
    pub registration_url: String,
}

impl EventInfo {
    pub fn new(event: &events::Model, now: NaiveDateTime, base_url: &str) -> Self {
        let status = EventStatus::of(event, now);
        let base_url = base_url.trim_end_matches('/');
        Self {
            id: event.id,
            name: event.name.clone(),
            description: event.description.clone(),
            start_datetime: event.start_datetime,
            end_datetime: event.end_datetime,
            event_type: event.event_type,
            event_type_display: event.event_type.display_name(),
            physical_location: event.physical_location.clone(),
            online_link: event.online_link.clone(),
            event_status: status,
            is_past: status == EventStatus::Past,
            event_detail_url: format!("{}/api/events/{}/", base_url, event.id),
            registration_url: format!("{}/events/{}/register", base_url, event.id),
        }
    }
}

pub async fn find_event(db: &DatabaseConnection, event_id: i32) -> Result<Option<events::Model>, DbErr> {
    events::Entity::find_by_id(event_id).one(db).await
}

/// Like [`find_event`], but hidden events are treated as missing.
pub async fn find_active_event(
    db: &DatabaseConnection,
    event_id: i32,
) -> Result<Option<events::Model>, DbErr> {
    events::Entity::find_by_id(event_id)
        .filter(events::Column::IsActive.eq(true))
        .one(db)
        .await
}

/// All active events, latest start first.
pub async fn list_active_events(db: &DatabaseConnection) -> Result<Vec<events::Model>, DbErr> {
    events::Entity::find()
        .filter(events::Column::IsActive.eq(true))
        .order_by_desc(events::Column::StartDatetime)
        .all(db)
        .await
}

/// Events an attendee's dashboard shows.
#[derive(Clone, Debug)]
pub struct Dashboard {
    /// Started and not yet ended. Events without an end time are not listed.
    pub ongoing: Vec<events::Model>,
    /// Not started yet.
    pub upcoming: Vec<events::Model>,
}

pub async fn dashboard(db: &DatabaseConnection, now: NaiveDateTime) -> Result<Dashboard, DbErr> {
    let ongoing = events::Entity::find()
        .filter(events::Column::IsActive.eq(true))
        .filter(events::Column::StartDatetime.lte(now))
        .filter(events::Column::EndDatetime.gte(now))
        .order_by_asc(events::Column::StartDatetime)
        .all(db)
        .await?;

    let upcoming = events::Entity::find()
        .filter(events::Column::IsActive.eq(true))
        .filter(events::Column::StartDatetime.gt(now))
        .order_by_asc(events::Column::StartDatetime)
        .all(db)
        .await?;

    Ok(Dashboard { ongoing, upcoming })
}

pub async fn attendee_count(db: &DatabaseConnection, event_id: i32) -> Result<usize, DbErr> {
    attendees::Entity::find()
        .filter(attendees::Column::EventId.eq(event_id))
        .count(db)
        .await
}
