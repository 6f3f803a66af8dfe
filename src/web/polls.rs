//! Question detail, results and voting endpoints

use super::redirect;
use crate::constants::{INDEX_URL, LOGIN_URL, SELECT_CHOICE_ERROR, VOTE_RECORDED, VOTING_NOT_ALLOWED};
use crate::middleware::ClientCtx;
use crate::notice::{self, Notice};
use crate::orm::{choices, questions};
use crate::poll::{self, ChoiceResult, VoteOutcome};
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_detail)
        .service(view_results)
        .service(vote);
}

/// Question fields prepared for templates, with the status flags evaluated once.
pub struct QuestionView {
    pub id: i32,
    pub question_text: String,
    pub pub_date: String,
    pub end_date: String,
    pub is_published: bool,
    pub can_vote: bool,
    pub was_published_recently: bool,
}

impl QuestionView {
    pub fn new(question: &questions::Model, now: NaiveDateTime) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text.to_owned(),
            pub_date: display_date(question.pub_date),
            end_date: display_date(question.end_date),
            is_published: question.is_published(now),
            can_vote: question.can_vote(now),
            was_published_recently: question.was_published_recently(now),
        }
    }

    pub fn detail_url(&self) -> String {
        format!("/polls/{}/", self.id)
    }

    pub fn results_url(&self) -> String {
        format!("/polls/{}/results/", self.id)
    }

    pub fn vote_url(&self) -> String {
        format!("/polls/{}/vote/", self.id)
    }
}

pub struct ChoiceView {
    pub id: i32,
    pub choice_text: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailTemplate {
    pub client: ClientCtx,
    pub notices: Vec<Notice>,
    pub question: QuestionView,
    pub choices: Vec<ChoiceView>,
    pub error_message: &'static str,
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub client: ClientCtx,
    pub notices: Vec<Notice>,
    pub question: QuestionView,
    pub results: Vec<ChoiceResult>,
}

#[derive(Deserialize)]
pub struct VoteFormData {
    #[serde(default)]
    pub csrf_token: String,
    pub choice: Option<String>,
}

fn display_date(date: NaiveDateTime) -> String {
    date.format("%b %-d, %Y, %H:%M UTC").to_string()
}

fn db_error(context: &'static str) -> impl Fn(DbErr) -> Error {
    move |e| {
        log::error!("{}: {}", context, e);
        error::ErrorInternalServerError("Database error.")
    }
}

async fn get_question_or_404(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<questions::Model, Error> {
    poll::find_question(db, question_id)
        .await
        .map_err(db_error("find_question()"))?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))
}

/// Builds the detail page, preselecting `selected` when present.
async fn render_detail(
    client: ClientCtx,
    notices: Vec<Notice>,
    db: &DatabaseConnection,
    question: &questions::Model,
    now: NaiveDateTime,
    error_message: &'static str,
) -> Result<HttpResponse, Error> {
    let choices = poll::choices_for(db, question.id)
        .await
        .map_err(db_error("choices_for()"))?;

    let selected = match client.get_id() {
        Some(user_id) => poll::vote_for(db, question.id, user_id)
            .await
            .map_err(db_error("vote_for()"))?
            .map(|v| v.choice_id),
        None => None,
    };

    Ok(DetailTemplate {
        client,
        notices,
        question: QuestionView::new(question, now),
        choices: choices
            .into_iter()
            .map(|c: choices::Model| ChoiceView {
                selected: selected == Some(c.id),
                id: c.id,
                choice_text: c.choice_text,
            })
            .collect(),
        error_message,
    }
    .to_response())
}

#[get("/polls/{question_id}/")]
pub async fn view_detail(
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = get_question_or_404(&db, path.into_inner()).await?;
    let now = Utc::now().naive_utc();

    if !question.can_vote(now) {
        notice::push(&cookies, Notice::info(VOTING_NOT_ALLOWED));
        return Ok(redirect(INDEX_URL));
    }

    render_detail(client, notice::take(&cookies), &db, &question, now, "").await
}

#[get("/polls/{question_id}/results/")]
pub async fn view_results(
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = get_question_or_404(&db, path.into_inner()).await?;
    let results = poll::results_for(&db, question.id)
        .await
        .map_err(db_error("results_for()"))?;

    Ok(ResultsTemplate {
        client,
        notices: notice::take(&cookies),
        question: QuestionView::new(&question, Utc::now().naive_utc()),
        results,
    }
    .to_response())
}

#[post("/polls/{question_id}/vote/")]
pub async fn vote(
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<VoteFormData>,
) -> Result<impl Responder, Error> {
    let question_id = path.into_inner();

    let user_id = match client.get_id() {
        Some(user_id) => user_id,
        None => {
            log::debug!("vote: anonymous vote on question {}", question_id);
            return Ok(redirect(&format!(
                "{}?next=/polls/{}/",
                LOGIN_URL, question_id
            )));
        }
    };

    let question = get_question_or_404(&db, question_id).await?;
    let now = Utc::now().naive_utc();

    if !question.can_vote(now) {
        notice::push(&cookies, Notice::info(VOTING_NOT_ALLOWED));
        return Ok(redirect(INDEX_URL));
    }

    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let choice_id = form
        .choice
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i32>().ok());

    let outcome = match choice_id {
        Some(choice_id) => poll::cast_vote(&db, question_id, choice_id, user_id, now)
            .await
            .map_err(db_error("cast_vote()"))?,
        None => None,
    };

    match outcome {
        Some(outcome) => {
            log::info!(
                "Vote {}: user_id {} on question {}",
                match outcome {
                    VoteOutcome::Created => "recorded",
                    VoteOutcome::Changed => "changed",
                },
                user_id,
                question_id
            );

            let view = QuestionView::new(&question, now);
            notice::push(
                &cookies,
                Notice::success(VOTE_RECORDED).with_link(view.detail_url(), "Vote again"),
            );
            Ok(redirect(&view.results_url()))
        }
        None => {
            render_detail(
                client,
                notice::take(&cookies),
                &db,
                &question,
                now,
                SELECT_CHOICE_ERROR,
            )
            .await
        }
    }
}
