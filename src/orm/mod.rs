//! SeaORM entities.

pub mod attendee_answers;
pub mod attendees;
pub mod event_questions;
pub mod events;
pub mod users;
