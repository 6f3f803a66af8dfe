//! CSRF (Cross-Site Request Forgery) protection
//!
//! Every session carries one random token. `ClientCtx` creates it on the first
//! request so templates can embed it; every POST form submits it back as a hidden
//! `csrf_token` field, and the handler checks it with [`validate_csrf_token`] before
//! mutating anything.
//!
//! ```html,ignore
//! <form method="post">
//!     <input type="hidden" name="csrf_token" value="{{ client.get_csrf_token() }}">
//! </form>
//! ```

use actix_session::Session;
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Returns the session's token, storing a new one if it has none yet.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    if let Ok(Some(token)) = session.get::<String>(CSRF_SESSION_KEY) {
        return Ok(token);
    }

    let token = generate_csrf_token();
    session
        .insert(CSRF_SESSION_KEY, token.clone())
        .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
    Ok(token)
}

/// Rejects the request with 403 unless `provided` equals the session's token.
pub fn validate_csrf_token(session: &Session, provided: &str) -> Result<(), Error> {
    let expected = session
        .get::<String>(CSRF_SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Failed to get CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("CSRF token not found in session"))?;

    if provided.is_empty() || provided != expected {
        log::warn!("CSRF token validation failed");
        return Err(error::ErrorForbidden("Invalid CSRF token"));
    }

    Ok(())
}
