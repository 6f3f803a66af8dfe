use crate::orm::users;
use crate::session::hash_password;
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use validator::Validate;

/// The authenticated visitor as seen by handlers and templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub id: i32,
    pub name: String,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
        }
    }
}

#[derive(Debug, Validate)]
pub struct NewUser<'a> {
    #[validate(length(min = 1, max = 150))]
    pub name: &'a str,
    #[validate(length(min = 8, max = 1000))]
    pub password: &'a str,
}

#[derive(Debug, derive_more::Display)]
pub enum CreateUserError {
    #[display(fmt = "invalid user data: {}", _0)]
    Invalid(validator::ValidationErrors),
    #[display(fmt = "user name already taken: {}", _0)]
    NameTaken(String),
    #[display(fmt = "failed to hash password: {}", _0)]
    Hash(String),
    #[display(fmt = "database error: {}", _0)]
    Database(DbErr),
}

impl std::error::Error for CreateUserError {}

impl From<DbErr> for CreateUserError {
    fn from(e: DbErr) -> Self {
        CreateUserError::Database(e)
    }
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Name.eq(name))
        .one(db)
        .await
}

/// Validates, hashes and stores a new account.
pub async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    password: &str,
    now: NaiveDateTime,
) -> Result<Profile, CreateUserError> {
    let name = name.trim();
    NewUser { name, password }
        .validate()
        .map_err(CreateUserError::Invalid)?;

    if find_by_name(db, name).await?.is_some() {
        return Err(CreateUserError::NameTaken(name.to_owned()));
    }

    let password_hash = hash_password(password).map_err(|e| CreateUserError::Hash(e.to_string()))?;

    let user = users::ActiveModel {
        name: Set(name.to_owned()),
        password: Set(password_hash),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("New user registered: {} (user_id: {})", user.name, user.id);
    Ok(user.into())
}
