//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::{Duration, Utc};
use kupolls::orm::{choices, questions, votes};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub password: String, // Plain text password for testing
}

/// Create a test user with known credentials
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    let profile = kupolls::user::create_user(db, username, password, Utc::now().naive_utc())
        .await
        .map_err(|e| DbErr::Custom(format!("create_user failed: {}", e)))?;

    Ok(TestUser {
        id: profile.id,
        username: profile.name,
        password: password.to_string(),
    })
}

/// Create a question published `pub_days` days from now and ending `end_days`
/// days from now. Negative offsets lie in the past.
pub async fn create_question(
    db: &DatabaseConnection,
    question_text: &str,
    pub_days: i64,
    end_days: i64,
) -> Result<questions::Model, DbErr> {
    let now = Utc::now().naive_utc();
    questions::ActiveModel {
        question_text: Set(question_text.to_string()),
        pub_date: Set(now + Duration::days(pub_days)),
        end_date: Set(now + Duration::days(end_days)),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a question published an hour ago, open for another day, with the given
/// choices.
pub async fn create_open_question(
    db: &DatabaseConnection,
    question_text: &str,
    choice_texts: &[&str],
) -> Result<(questions::Model, Vec<choices::Model>), DbErr> {
    let now = Utc::now().naive_utc();
    kupolls::admin::create_question(
        db,
        question_text,
        now - Duration::hours(1),
        now + Duration::days(1),
        choice_texts,
    )
    .await
}

/// All votes a user has on a question.
pub async fn votes_of(
    db: &DatabaseConnection,
    question_id: i32,
    user_id: i32,
) -> Result<Vec<votes::Model>, DbErr> {
    votes::Entity::find()
        .filter(votes::Column::QuestionId.eq(question_id))
        .filter(votes::Column::UserId.eq(user_id))
        .all(db)
        .await
}
