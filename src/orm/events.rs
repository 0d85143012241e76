//! SeaORM Entity for events table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How attendees take part in an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
#[derive(Default)]
pub enum EventType {
    #[sea_orm(string_value = "Physical")]
    #[default]
    Physical,
    #[sea_orm(string_value = "Online")]
    Online,
    #[sea_orm(string_value = "Hybrid")]
    Hybrid,
}

impl EventType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Online => "Online",
            Self::Hybrid => "Hybrid",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub start_datetime: DateTime,
    #[sea_orm(nullable)]
    pub end_datetime: Option<DateTime>,
    pub event_type: EventType,
    /// Venue address, blank for online events.
    pub physical_location: String,
    pub online_link: String,
    pub is_active: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_questions::Entity")]
    EventQuestions,
    #[sea_orm(has_many = "super::attendees::Entity")]
    Attendees,
}

impl Related<super::event_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventQuestions.def()
    }
}

impl Related<super::attendees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
