//! Administrative operations on questions and choices.

use crate::orm::{choices, questions, votes};
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, TransactionTrait};

/// One row of the administrative question listing.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionRow {
    pub id: i32,
    pub question_text: String,
    pub pub_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub was_published_recently: bool,
    pub is_published: bool,
    pub can_vote: bool,
}

/// Creates a question and its inline choices in one transaction.
///
/// An end date before the publish date is stored as given; such a question simply
/// never opens for voting.
pub async fn create_question<S: AsRef<str>>(
    db: &DatabaseConnection,
    question_text: &str,
    pub_date: NaiveDateTime,
    end_date: NaiveDateTime,
    choice_texts: &[S],
) -> Result<(questions::Model, Vec<choices::Model>), DbErr> {
    if end_date < pub_date {
        log::warn!(
            "create_question: end date {} precedes publish date {} for {:?}",
            end_date,
            pub_date,
            question_text
        );
    }

    let txn = db.begin().await?;

    let question = questions::ActiveModel {
        question_text: Set(question_text.to_owned()),
        pub_date: Set(pub_date),
        end_date: Set(end_date),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut created = Vec::with_capacity(choice_texts.len());
    for text in choice_texts {
        let choice = choices::ActiveModel {
            question_id: Set(question.id),
            choice_text: Set(text.as_ref().to_owned()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        created.push(choice);
    }

    txn.commit().await?;

    log::info!(
        "Question created: {:?} (question_id: {}, choices: {})",
        question.question_text,
        question.id,
        created.len()
    );
    Ok((question, created))
}

/// Adds one choice to an existing question. Returns `None` if the question is unknown.
pub async fn add_choice(
    db: &DatabaseConnection,
    question_id: i32,
    choice_text: &str,
) -> Result<Option<choices::Model>, DbErr> {
    if questions::Entity::find_by_id(question_id)
        .one(db)
        .await?
        .is_none()
    {
        return Ok(None);
    }

    let choice = choices::ActiveModel {
        question_id: Set(question_id),
        choice_text: Set(choice_text.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(Some(choice))
}

/// Deletes a question together with its votes and choices.
/// Returns false if there was no such question.
pub async fn delete_question(db: &DatabaseConnection, question_id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    votes::Entity::delete_many()
        .filter(votes::Column::QuestionId.eq(question_id))
        .exec(&txn)
        .await?;
    choices::Entity::delete_many()
        .filter(choices::Column::QuestionId.eq(question_id))
        .exec(&txn)
        .await?;
    let res = questions::Entity::delete_by_id(question_id)
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if res.rows_affected > 0 {
        log::info!("Question deleted: question_id {}", question_id);
    }
    Ok(res.rows_affected > 0)
}

/// Listing with the derived status columns evaluated at `now`, most recently
/// published first. A non-empty `search` keeps only questions whose text contains it.
pub async fn question_rows(
    db: &DatabaseConnection,
    now: NaiveDateTime,
    search: Option<&str>,
) -> Result<Vec<QuestionRow>, DbErr> {
    let mut query = questions::Entity::find();
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(questions::Column::QuestionText.contains(term));
    }

    Ok(query
        .order_by_desc(questions::Column::PubDate)
        .order_by_desc(questions::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|q| QuestionRow {
            was_published_recently: q.was_published_recently(now),
            is_published: q.is_published(now),
            can_vote: q.can_vote(now),
            id: q.id,
            question_text: q.question_text,
            pub_date: q.pub_date,
            end_date: q.end_date,
        })
        .collect())
}
