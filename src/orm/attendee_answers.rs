//! SeaORM Entity for attendee_answers table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attendee_answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub attendee_id: i32,
    pub question_id: i32,
    #[sea_orm(column_type = "Text")]
    pub answer: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendees::Entity",
        from = "Column::AttendeeId",
        to = "super::attendees::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Attendee,
    #[sea_orm(
        belongs_to = "super::event_questions::Entity",
        from = "Column::QuestionId",
        to = "super::event_questions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Question,
}

impl Related<super::attendees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendee.def()
    }
}

impl Related<super::event_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
