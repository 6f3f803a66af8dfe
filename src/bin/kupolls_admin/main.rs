//! Command line administration for questions, choices and accounts.
//!
//! ```text
//! kupolls-admin create-user <name> <password>
//! kupolls-admin create-question <text> <publish> <end> [choice ...]
//! kupolls-admin add-choice <question_id> <text>
//! kupolls-admin delete-question <question_id>
//! kupolls-admin list [search]
//! ```
//!
//! Dates are UTC, written as `2024-03-01 09:00`, `2024-03-01T09:00:00` or `2024-03-01`.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use env_logger::Env;
use kupolls::app_config::AppConfig;
use kupolls::{admin, db, user};

const USAGE: &str = "usage: kupolls-admin <create-user|create-question|add-choice|delete-question|list> [args...]";

fn parse_date(raw: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("unrecognised date: {:?}", raw))
}

fn parse_id(raw: &str) -> Result<i32> {
    raw.parse::<i32>()
        .with_context(|| format!("not a question id: {:?}", raw))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => bail!(USAGE),
    };

    let config = AppConfig::load()?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = db::connect(&database_url, config.database.max_connections).await?;
    db::init_schema(&db).await?;

    let now = Utc::now().naive_utc();

    match (command, rest) {
        ("create-user", [name, password]) => {
            let profile = user::create_user(&db, name, password, now).await?;
            println!("Created user {} (id {})", profile.name, profile.id);
        }
        ("create-question", [text, publish, end, choices @ ..]) => {
            let (question, choices) =
                admin::create_question(&db, text, parse_date(publish)?, parse_date(end)?, choices)
                    .await?;
            println!(
                "Created question {} with {} choice(s)",
                question.id,
                choices.len()
            );
        }
        ("add-choice", [question_id, text]) => {
            let question_id = parse_id(question_id)?;
            match admin::add_choice(&db, question_id, text).await? {
                Some(choice) => println!("Added choice {} to question {}", choice.id, question_id),
                None => bail!("no question with id {}", question_id),
            }
        }
        ("delete-question", [question_id]) => {
            let question_id = parse_id(question_id)?;
            if !admin::delete_question(&db, question_id).await? {
                bail!("no question with id {}", question_id);
            }
            println!("Deleted question {}", question_id);
        }
        ("list", _) if rest.len() <= 1 => {
            let search = rest.first().map(String::as_str);
            let rows = admin::question_rows(&db, now, search).await?;
            if rows.is_empty() {
                println!("{}", kupolls::constants::NO_POLLS_MESSAGE);
            }
            for row in rows {
                println!(
                    "{:>5}  {}  {}  recent={} published={} open={}  {}",
                    row.id,
                    row.pub_date.format("%Y-%m-%d %H:%M"),
                    row.end_date.format("%Y-%m-%d %H:%M"),
                    row.was_published_recently,
                    row.is_published,
                    row.can_vote,
                    row.question_text
                );
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
