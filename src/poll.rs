//! Poll rules and storage access for questions, choices and votes.
//!
//! Relationships are never traversed implicitly; each lookup goes through one of the
//! functions below, keyed on an indexed foreign key.

use crate::orm::{choices, questions, votes};
use chrono::{Duration, NaiveDateTime};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult, Statement,
    TransactionTrait,
};

impl questions::Model {
    /// True once the publish time has been reached.
    pub fn is_published(&self, now: NaiveDateTime) -> bool {
        now >= self.pub_date
    }

    /// True while `now` lies within `[pub_date, end_date]`.
    /// A question whose end precedes its publish time never accepts votes.
    pub fn can_vote(&self, now: NaiveDateTime) -> bool {
        self.pub_date <= now && now <= self.end_date
    }

    /// True if published at most one day before `now`.
    pub fn was_published_recently(&self, now: NaiveDateTime) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

/// A choice with the number of votes referencing it.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct ChoiceResult {
    pub id: i32,
    pub question_id: i32,
    pub choice_text: String,
    pub vote_count: i64,
}

/// Whether a vote created a new row or moved an existing one to another choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Created,
    Changed,
}

/// All questions, most recently published first. No status filtering is applied.
pub async fn list_questions(db: &DatabaseConnection) -> Result<Vec<questions::Model>, DbErr> {
    questions::Entity::find()
        .order_by_desc(questions::Column::PubDate)
        .order_by_desc(questions::Column::Id)
        .all(db)
        .await
}

pub async fn find_question(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<Option<questions::Model>, DbErr> {
    questions::Entity::find_by_id(question_id).one(db).await
}

/// Choices belonging to a question, in creation order.
pub async fn choices_for<C>(db: &C, question_id: i32) -> Result<Vec<choices::Model>, DbErr>
where
    C: ConnectionTrait,
{
    choices::Entity::find()
        .filter(choices::Column::QuestionId.eq(question_id))
        .order_by_asc(choices::Column::Id)
        .all(db)
        .await
}

/// Returns the choice only if it belongs to `question_id`.
pub async fn choice_in_question<C>(
    db: &C,
    question_id: i32,
    choice_id: i32,
) -> Result<Option<choices::Model>, DbErr>
where
    C: ConnectionTrait,
{
    choices::Entity::find_by_id(choice_id)
        .filter(choices::Column::QuestionId.eq(question_id))
        .one(db)
        .await
}

/// The user's current vote on a question, if any.
pub async fn vote_for<C>(db: &C, question_id: i32, user_id: i32) -> Result<Option<votes::Model>, DbErr>
where
    C: ConnectionTrait,
{
    votes::Entity::find()
        .filter(votes::Column::QuestionId.eq(question_id))
        .filter(votes::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Every choice of a question with its derived vote count.
pub async fn results_for(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<Vec<ChoiceResult>, DbErr> {
    let sql = r#"
        SELECT
            c.id,
            c.question_id,
            c.choice_text,
            COUNT(v.id) AS vote_count
        FROM choices c
        LEFT JOIN votes v ON v.choice_id = c.id
        WHERE c.question_id = $1
        GROUP BY c.id, c.question_id, c.choice_text
        ORDER BY c.id
    "#;

    ChoiceResult::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        vec![question_id.into()],
    ))
    .all(db)
    .await
}

/// True if `err` comes from the one-vote-per-user index, on either backend.
pub fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(msg) | DbErr::Query(msg) => {
            msg.contains("votes_user_question_unique")
                || msg.contains("UNIQUE constraint failed: votes.user_id")
        }
        _ => false,
    }
}

/// Records `choice_id` as the user's selection for `question_id`.
///
/// The lookup and the write share one transaction. An existing vote is reassigned,
/// otherwise a new row is inserted. Returns `Ok(None)` without writing anything when
/// the choice does not belong to the question.
///
/// If a concurrent first vote by the same user wins the insert, the unique index
/// rejects ours and the whole attempt is repeated once, now reassigning that row.
pub async fn cast_vote(
    db: &DatabaseConnection,
    question_id: i32,
    choice_id: i32,
    user_id: i32,
    now: NaiveDateTime,
) -> Result<Option<VoteOutcome>, DbErr> {
    match try_cast_vote(db, question_id, choice_id, user_id, now).await {
        Err(e) if is_unique_violation(&e) => {
            log::debug!(
                "cast_vote: concurrent vote by user_id {} on question {}, retrying",
                user_id,
                question_id
            );
            try_cast_vote(db, question_id, choice_id, user_id, now).await
        }
        res => res,
    }
}

async fn try_cast_vote(
    db: &DatabaseConnection,
    question_id: i32,
    choice_id: i32,
    user_id: i32,
    now: NaiveDateTime,
) -> Result<Option<VoteOutcome>, DbErr> {
    // Dropping the transaction on an early `?` rolls it back.
    let txn = db.begin().await?;

    if choice_in_question(&txn, question_id, choice_id)
        .await?
        .is_none()
    {
        txn.rollback().await?;
        return Ok(None);
    }

    let outcome = match vote_for(&txn, question_id, user_id).await? {
        Some(existing) => {
            let mut vote: votes::ActiveModel = existing.into();
            vote.choice_id = Set(choice_id);
            vote.update(&txn).await?;
            VoteOutcome::Changed
        }
        None => {
            votes::ActiveModel {
                question_id: Set(question_id),
                choice_id: Set(choice_id),
                user_id: Set(user_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            VoteOutcome::Created
        }
    };

    txn.commit().await?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn question(pub_offset: Duration, end_offset: Duration) -> questions::Model {
        let now = Utc::now().naive_utc();
        questions::Model {
            id: 1,
            question_text: "Test question".to_owned(),
            pub_date: now + pub_offset,
            end_date: now + end_offset,
        }
    }

    #[test]
    fn test_was_published_recently_with_future_question() {
        let q = question(Duration::days(30), Duration::days(31));
        assert!(!q.was_published_recently(Utc::now().naive_utc()));
    }

    #[test]
    fn test_was_published_recently_with_old_question() {
        let q = question(-(Duration::days(1) + Duration::seconds(1)), Duration::days(1));
        assert!(!q.was_published_recently(Utc::now().naive_utc()));
    }

    #[test]
    fn test_was_published_recently_with_recent_question() {
        let q = question(
            -(Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59)),
            Duration::days(1),
        );
        assert!(q.was_published_recently(Utc::now().naive_utc()));
    }

    #[test]
    fn test_is_published_with_past_question() {
        let q = question(-Duration::days(5), Duration::days(1));
        assert!(q.is_published(Utc::now().naive_utc()));
    }

    #[test]
    fn test_is_published_with_future_question() {
        let q = question(Duration::hours(3), Duration::days(1));
        assert!(!q.is_published(Utc::now().naive_utc()));
    }

    #[test]
    fn test_can_vote_with_closed_question() {
        let q = question(-Duration::days(3), -Duration::days(1));
        assert!(!q.can_vote(Utc::now().naive_utc()));
    }

    #[test]
    fn test_can_vote_with_future_question() {
        let q = question(Duration::days(1), Duration::days(3));
        assert!(!q.can_vote(Utc::now().naive_utc()));
    }

    #[test]
    fn test_can_vote_with_open_question() {
        let q = question(-Duration::days(1), Duration::days(1));
        assert!(q.can_vote(Utc::now().naive_utc()));
    }

    #[test]
    fn test_can_vote_window_bounds_are_inclusive() {
        let q = question(-Duration::days(1), Duration::days(1));
        assert!(q.can_vote(q.pub_date));
        assert!(q.can_vote(q.end_date));
        assert!(!q.can_vote(q.end_date + Duration::seconds(1)));
        assert!(!q.can_vote(q.pub_date - Duration::seconds(1)));
    }

    #[test]
    fn test_unique_violation_is_recognised() {
        assert!(is_unique_violation(&DbErr::Exec(
            "error returned from database: UNIQUE constraint failed: votes.user_id, votes.question_id"
                .to_owned()
        )));
        assert!(is_unique_violation(&DbErr::Query(
            "duplicate key value violates unique constraint \"votes_user_question_unique\""
                .to_owned()
        )));
        assert!(!is_unique_violation(&DbErr::Exec(
            "FOREIGN KEY constraint failed".to_owned()
        )));
        assert!(!is_unique_violation(&DbErr::RecordNotFound("vote".to_owned())));
    }

    #[test]
    fn test_inverted_window_never_accepts_votes() {
        let q = question(Duration::days(1), -Duration::days(1));
        let now = Utc::now().naive_utc();
        assert!(!q.can_vote(now));
        assert!(!q.can_vote(q.pub_date));
        assert!(!q.can_vote(q.end_date));
    }
}
