use crate::events::{AuthEvent, AuthEvents};
use crate::ip::extract_client_ip;
use crate::middleware::client_ctx::{session_token, SESSION_TOKEN_KEY};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::notice::Notice;
use crate::session::logout;
use actix_web::{post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_logout);
}

#[derive(Template)]
#[template(path = "logout.html")]
struct LogoutTemplate {
    client: ClientCtx,
    notices: Vec<Notice>,
}

#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    csrf_token: String,
}

#[post("/accounts/logout/")]
pub async fn post_logout(
    req: HttpRequest,
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    events: web::Data<AuthEvents>,
    form: web::Form<FormData>,
) -> Result<impl Responder, Error> {
    validate_csrf_token(&cookies, &form.csrf_token)?;

    // Remove session from database
    match session_token(&cookies) {
        Some(token) => {
            if let Err(e) = logout(&db, token).await {
                log::error!("post_logout: logout() {}", e);
            }
        }
        None => {
            log::debug!("post_logout: missing token (already logged out?)");
        }
    }

    if let Some(user) = client.get_user() {
        events.emit(&AuthEvent::LoggedOut {
            user_id: user.id,
            name: user.name.to_owned(),
            ip: extract_client_ip(&req),
        });
    }

    cookies.remove(SESSION_TOKEN_KEY);

    // A fresh context so the page renders the visitor as a guest.
    let guest_client = ClientCtx::from_session(&cookies, &db).await;

    Ok(LogoutTemplate {
        client: guest_client,
        notices: Vec::new(),
    }
    .to_response())
}
