//! Database connection and schema setup.

use crate::orm::{attendee_answers, attendees, event_questions, events, users};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

/// Name of the unique index that keeps one registration per (user, event).
pub const ATTENDEE_UNIQUE_INDEX: &str = "idx_attendees_user_event";

/// Open a connection pool.
///
/// In-memory SQLite gives every pooled connection its own database, so such
/// URLs are always capped to a single connection.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let max_connections = if url.starts_with("sqlite::memory:") {
        1
    } else {
        max_connections.max(1)
    };

    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    log::info!(
        "Connected to {:?} database ({} max connections)",
        db.get_database_backend(),
        max_connections
    );
    Ok(db)
}

/// Create every table the portal uses, plus the registration unique index.
/// Existing tables are left alone.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Parents before children so foreign keys resolve.
    create_table(db, users::Entity).await?;
    create_table(db, events::Entity).await?;
    create_table(db, event_questions::Entity).await?;
    create_table(db, attendees::Entity).await?;
    create_table(db, attendee_answers::Entity).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON attendees (user_id, event_id)",
            ATTENDEE_UNIQUE_INDEX
        ),
    ))
    .await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
