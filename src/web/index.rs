use super::polls::QuestionView;
use super::redirect;
use crate::constants::{INDEX_URL, NO_POLLS_MESSAGE};
use crate::middleware::ClientCtx;
use crate::notice::{self, Notice};
use crate::poll::list_questions;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_root).service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub notices: Vec<Notice>,
    pub questions: Vec<QuestionView>,
    pub empty_message: &'static str,
}

#[get("/")]
pub async fn view_root() -> impl Responder {
    redirect(INDEX_URL)
}

/// Every question, newest first. Unpublished and closed questions are listed too,
/// with their links disabled.
#[get("/polls/")]
pub async fn view_index(
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let now = Utc::now().naive_utc();
    let questions = list_questions(&db)
        .await
        .map_err(|e| {
            log::error!("view_index: list_questions() {}", e);
            error::ErrorInternalServerError("Could not load polls.")
        })?
        .iter()
        .map(|q| QuestionView::new(q, now))
        .collect();

    Ok(IndexTemplate {
        client,
        notices: notice::take(&cookies),
        questions,
        empty_message: NO_POLLS_MESSAGE,
    }
    .to_response())
}
