//! SeaORM Entity for event_questions table
//!
//! `field_type` holds the short kind code (`text`, `textarea`, `dropdown`,
//! `radio`, `checkbox`) as plain text so that an unsupported code can be
//! reported as a configuration problem instead of failing the row decode.
//! `choices` holds one choice per line.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "event_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub label: String,
    pub field_type: String,
    pub is_required: bool,
    #[sea_orm(column_type = "Text")]
    pub choices: String,
    pub display_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Event,
    #[sea_orm(has_many = "super::attendee_answers::Entity")]
    AttendeeAnswers,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::attendee_answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendeeAnswers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
