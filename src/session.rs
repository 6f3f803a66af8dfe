//! Authentication: password hashing, session tokens and identity lookup.

use crate::orm::{sessions, users};
use crate::user::{find_by_name, Profile};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, NaiveDateTime};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use uuid::Uuid;

#[derive(Debug, derive_more::Display)]
pub enum AuthError {
    /// Unknown name or wrong password. The two are reported identically.
    #[display(fmt = "invalid username or password")]
    BadCredentials,
    #[display(fmt = "database error: {}", _0)]
    Database(DbErr),
}

impl std::error::Error for AuthError {}

impl From<DbErr> for AuthError {
    fn from(e: DbErr) -> Self {
        AuthError::Database(e)
    }
}

/// A freshly issued session.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub token: Uuid,
    pub user: Profile,
    pub expires_at: NaiveDateTime,
}

pub fn get_argon2() -> Argon2<'static> {
    Argon2::default()
}

/// Hashes a password into a PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is unreadable: {}", e);
            false
        }
    }
}

/// Verifies credentials and opens a session lasting `ttl`.
pub async fn login(
    db: &DatabaseConnection,
    name: &str,
    password: &str,
    ttl: Duration,
    now: NaiveDateTime,
) -> Result<IssuedSession, AuthError> {
    let user = match find_by_name(db, name.trim()).await? {
        Some(user) => user,
        None => return Err(AuthError::BadCredentials),
    };

    if !verify_password(password, &user.password) {
        return Err(AuthError::BadCredentials);
    }

    let token = Uuid::new_v4();
    let expires_at = now + ttl;
    sessions::ActiveModel {
        id: Set(token.to_string()),
        user_id: Set(user.id),
        created_at: Set(now),
        expires_at: Set(expires_at),
    }
    .insert(db)
    .await?;

    Ok(IssuedSession {
        token,
        user: user.into(),
        expires_at,
    })
}

/// Ends a session. Unknown tokens are ignored.
pub async fn logout(db: &DatabaseConnection, token: Uuid) -> Result<(), DbErr> {
    sessions::Entity::delete_by_id(token.to_string())
        .exec(db)
        .await?;
    Ok(())
}

/// Resolves a session token to its user. `None` means anonymous, including for
/// expired sessions.
pub async fn current_user(
    db: &DatabaseConnection,
    token: Uuid,
    now: NaiveDateTime,
) -> Result<Option<Profile>, DbErr> {
    let found = sessions::Entity::find_by_id(token.to_string())
        .find_also_related(users::Entity)
        .one(db)
        .await?;

    match found {
        Some((session, Some(user))) if session.expires_at > now => Ok(Some(user.into())),
        _ => Ok(None),
    }
}

/// Deletes every expired session. Returns how many were removed.
pub async fn remove_expired_sessions(db: &DatabaseConnection, now: NaiveDateTime) -> Result<u64, DbErr> {
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
