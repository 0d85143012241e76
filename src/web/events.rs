//! Read-only event catalog API.

use super::error::db_error;
use crate::app_config;
use crate::events::{dashboard, find_active_event, list_active_events, EventInfo};
use crate::middleware::ClientCtx;
use crate::orm::events;
use actix_web::{error, get, web, Error, HttpResponse, Responder};
use chrono::{NaiveDateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_events)
        .service(view_event)
        .service(view_dashboard);
}

#[derive(Serialize)]
struct DashboardResponse {
    ongoing: Vec<EventInfo>,
    upcoming: Vec<EventInfo>,
}

fn to_infos(events: &[events::Model], now: NaiveDateTime) -> Vec<EventInfo> {
    let base_url = app_config::site().base_url;
    events
        .iter()
        .map(|event| EventInfo::new(event, now, &base_url))
        .collect()
}

/// GET /api/events/ - Active events, latest start first
#[get("/api/events/")]
pub async fn list_events(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let events = list_active_events(&db).await.map_err(db_error)?;
    Ok(HttpResponse::Ok().json(to_infos(&events, Utc::now().naive_utc())))
}

/// GET /api/events/{id}/ - One active event with its status
#[get("/api/events/{event_id}/")]
pub async fn view_event(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let event = find_active_event(&db, path.into_inner())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Event not found."))?;

    Ok(HttpResponse::Ok().json(EventInfo::new(
        &event,
        Utc::now().naive_utc(),
        &app_config::site().base_url,
    )))
}

/// GET /api/dashboard/ - Ongoing and upcoming events for a signed-in user
#[get("/api/dashboard/")]
pub async fn view_dashboard(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let now = Utc::now().naive_utc();
    let board = dashboard(&db, now).await.map_err(db_error)?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        ongoing: to_infos(&board.ongoing, now),
        upcoming: to_infos(&board.upcoming, now),
    }))
}
