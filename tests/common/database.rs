//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use std::env;

/// Uses TEST_DATABASE_URL if set, otherwise a private in-memory SQLite database.
fn test_database_url() -> String {
    env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

/// Setup test database - connect and create the schema.
///
/// Every call to this with the default URL yields a fresh, empty database.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = kupolls::db::connect(&test_database_url(), 1).await?;
    kupolls::db::init_schema(&db).await?;
    Ok(db)
}

/// Remove every row, children first.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    for table in ["votes", "choices", "questions", "sessions", "users"] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("DELETE FROM {};", table),
        ))
        .await?;
    }
    Ok(())
}
