//! Test database setup
#![allow(dead_code)]

use efs_portal::db::{connect, create_schema};
use sea_orm::{DatabaseConnection, DbErr};

/// A fresh in-memory SQLite database with the portal schema.
///
/// Every call returns an isolated database, so tests need no cleanup and can
/// run in parallel.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = connect("sqlite::memory:", 1).await?;
    create_schema(&db).await?;
    Ok(db)
}
