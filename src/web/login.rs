use crate::app_config::AppConfig;
use crate::constants::{BAD_CREDENTIALS, INDEX_URL};
use crate::events::{AuthEvent, AuthEvents};
use crate::ip::extract_client_ip;
use crate::middleware::client_ctx::SESSION_TOKEN_KEY;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::notice::{self, Notice};
use crate::session::{self, AuthError};
use actix_web::http::StatusCode;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub notices: Vec<Notice>,
    pub next: &'a str,
    pub username: &'a str,
    pub error_message: &'a str,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    next: String,
}

#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    csrf_token: String,
    username: String,
    password: String,
    #[serde(default)]
    next: String,
}

/// Returns `next` if it is a local path, otherwise the index.
/// Scheme-relative (`//host`) and backslash forms are rejected.
pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        INDEX_URL
    }
}

#[post("/accounts/login/")]
pub async fn post_login(
    req: HttpRequest,
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    events: web::Data<AuthEvents>,
    form: web::Form<FormData>,
) -> Result<impl Responder, Error> {
    validate_csrf_token(&cookies, &form.csrf_token)?;

    let ip = extract_client_ip(&req);
    let now = Utc::now().naive_utc();

    match session::login(&db, &form.username, &form.password, config.session_ttl(), now).await {
        Ok(sess) => {
            cookies.renew();
            cookies
                .insert(SESSION_TOKEN_KEY, sess.token.to_string())
                .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

            events.emit(&AuthEvent::LoggedIn {
                user_id: sess.user.id,
                name: sess.user.name,
                ip,
            });

            Ok(super::redirect(safe_next(&form.next)))
        }
        Err(AuthError::BadCredentials) => {
            log::debug!("login failure for {}", form.username);
            events.emit(&AuthEvent::LoginFailed {
                name: form.username.trim().to_owned(),
                ip,
            });

            let body = LoginTemplate {
                client,
                notices: notice::take(&cookies),
                next: &form.next,
                username: &form.username,
                error_message: BAD_CREDENTIALS,
            }
            .render()
            .map_err(|e| {
                log::error!("post_login: render() {}", e);
                error::ErrorInternalServerError("Template error")
            })?;

            Ok(HttpResponse::build(StatusCode::UNAUTHORIZED)
                .content_type("text/html; charset=utf-8")
                .body(body))
        }
        Err(AuthError::Database(e)) => {
            log::error!("post_login: login() {}", e);
            Err(error::ErrorInternalServerError("DB error"))
        }
    }
}

#[get("/accounts/login/")]
pub async fn view_login(
    client: ClientCtx,
    cookies: actix_session::Session,
    query: web::Query<LoginQuery>,
) -> Result<impl Responder, Error> {
    Ok(LoginTemplate {
        client,
        notices: notice::take(&cookies),
        next: &query.next,
        username: "",
        error_message: "",
    }
    .to_response())
}
