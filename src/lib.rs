//! Event signup portal: per-event custom questions rendered as dynamic forms,
//! validated submissions and an all-or-nothing registration write.

pub mod app_config;
pub mod constants;
pub mod db;
pub mod email;
pub mod events;
pub mod forms;
pub mod middleware;
pub mod notify;
pub mod orm;
pub mod questions;
pub mod registration;
pub mod summary;
pub mod web;
