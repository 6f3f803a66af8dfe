//! Database connection and schema bootstrap.

use crate::orm::{choices, questions, sessions, users, votes};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

/// Opens a connection pool for `url`.
///
/// In-memory SQLite databases live and die with a single connection, so the pool is
/// clamped to one connection for them.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let max_connections = if url.starts_with("sqlite::memory:") {
        1
    } else {
        max_connections
    };

    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    log::info!("Connected to database (max_connections = {})", max_connections);
    Ok(db)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates every table and index the application needs, skipping those that exist.
///
/// Order matters: referenced tables are created before the tables holding foreign keys.
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, sessions::Entity).await?;
    create_table(db, &schema, questions::Entity).await?;
    create_table(db, &schema, choices::Entity).await?;
    create_table(db, &schema, votes::Entity).await?;

    db.execute(Statement::from_string(
        backend,
        "CREATE UNIQUE INDEX IF NOT EXISTS votes_user_question_unique
            ON votes (user_id, question_id);"
            .to_string(),
    ))
    .await?;

    Ok(())
}
