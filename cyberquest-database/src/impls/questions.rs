use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use tracing::warn;

use crate::{
    database::Database,
    model::question::{
        Difficulty, NewQuestion, Question, QuestionType, decode_options, encode_options,
    },
};

const QUESTION_COLUMNS: &str = "id, question_text, question_type, options, correct_answer, \
                                category, difficulty, hint, level_required, time_limit, \
                                created_by, created_at";

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    question_text: String,
    question_type: String,
    options: Option<String>,
    correct_answer: String,
    category: String,
    difficulty: String,
    hint: Option<String>,
    level_required: i32,
    time_limit: i32,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
}

/// Which `level_required` values a selection may draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelScope {
    Exactly(i32),
    UpTo(i32),
}

#[derive(Clone, Debug)]
pub struct QuestionFilter<'a> {
    pub level: LevelScope,
    pub difficulty: Option<Difficulty>,
    pub category: Option<&'a str>,
    /// Skip questions this user already has progress rows for.
    pub exclude_answered_by: Option<i64>,
}

pub async fn create_question(
    db: &Database,
    question: &NewQuestion,
    created_by: Option<i64>,
) -> anyhow::Result<Question> {
    let options = encode_options(question.options.as_deref())?;

    let row: QuestionRow = sqlx::query_as(&format!(
        "INSERT INTO questions (
            question_text, question_type, options, correct_answer, category,
            difficulty, hint, level_required, time_limit, created_by
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(&question.question_text)
    .bind(question.question_type.as_str())
    .bind(options)
    .bind(&question.correct_answer)
    .bind(&question.category)
    .bind(question.difficulty.as_str())
    .bind(question.hint.as_deref())
    .bind(question.level_required)
    .bind(question.time_limit)
    .bind(created_by)
    .fetch_one(db.pool())
    .await?;

    to_question(row)
}

/// Fetch a question by id if it is of a supported type.
pub async fn get_supported_question(
    db: &Database,
    question_id: i64,
) -> anyhow::Result<Option<Question>> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = "
    ));
    builder.push_bind(question_id);
    push_servable(&mut builder);

    let row: Option<QuestionRow> = builder
        .build_query_as()
        .fetch_optional(db.pool())
        .await?;

    row.map(to_question).transpose()
}

/// Hint text for a supported question. `None` when the question is missing
/// or unsupported, `Some(None)` when it exists without a hint.
pub async fn get_hint(db: &Database, question_id: i64) -> anyhow::Result<Option<Option<String>>> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT hint FROM questions WHERE id = ");
    builder.push_bind(question_id);
    push_servable(&mut builder);

    let hint: Option<Option<String>> = builder
        .build_query_scalar()
        .fetch_optional(db.pool())
        .await?;

    Ok(hint.map(|hint| hint.filter(|text| !text.trim().is_empty())))
}

/// Supported questions, newest first.
pub async fn list_supported_questions(db: &Database) -> anyhow::Result<Vec<Question>> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"
    ));
    push_servable(&mut builder);
    builder.push(" ORDER BY created_at DESC, id DESC");

    let rows: Vec<QuestionRow> = builder.build_query_as().fetch_all(db.pool()).await?;
    Ok(decode_rows(rows))
}

/// Every supported question matching `filter`, in id order.
pub async fn candidate_questions(
    db: &Database,
    filter: &QuestionFilter<'_>,
) -> anyhow::Result<Vec<Question>> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"
    ));
    push_servable(&mut builder);

    match filter.level {
        LevelScope::Exactly(level) => {
            builder.push(" AND level_required = ").push_bind(level);
        }
        LevelScope::UpTo(level) => {
            builder.push(" AND level_required <= ").push_bind(level);
        }
    }

    if let Some(difficulty) = filter.difficulty {
        builder
            .push(" AND LOWER(TRIM(difficulty)) = ")
            .push_bind(difficulty.as_str());
    }

    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category.to_owned());
    }

    if let Some(user_id) = filter.exclude_answered_by {
        builder
            .push(" AND id NOT IN (SELECT question_id FROM user_progress WHERE user_id = ")
            .push_bind(user_id)
            .push(")");
    }

    builder.push(" ORDER BY id ASC");

    let rows: Vec<QuestionRow> = builder.build_query_as().fetch_all(db.pool()).await?;
    Ok(decode_rows(rows))
}

/// Number of supported questions per `level_required`, ascending.
pub async fn question_counts_by_level(db: &Database) -> anyhow::Result<Vec<(i32, i64)>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT level_required, COUNT(*) FROM questions WHERE TRUE",
    );
    push_servable(&mut builder);
    builder.push(" GROUP BY level_required ORDER BY level_required ASC");

    let counts: Vec<(i32, i64)> = builder.build_query_as().fetch_all(db.pool()).await?;
    Ok(counts)
}

pub async fn update_question(
    db: &Database,
    question_id: i64,
    question: &NewQuestion,
) -> anyhow::Result<bool> {
    let options = encode_options(question.options.as_deref())?;

    let updated = sqlx::query(
        "UPDATE questions
         SET question_text = $1, question_type = $2, options = $3, correct_answer = $4,
             category = $5, difficulty = $6, hint = $7, level_required = $8, time_limit = $9
         WHERE id = $10",
    )
    .bind(&question.question_text)
    .bind(question.question_type.as_str())
    .bind(options)
    .bind(&question.correct_answer)
    .bind(&question.category)
    .bind(question.difficulty.as_str())
    .bind(question.hint.as_deref())
    .bind(question.level_required)
    .bind(question.time_limit)
    .bind(question_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Delete a question together with the progress rows that reference it.
pub async fn delete_question(db: &Database, question_id: i64) -> anyhow::Result<bool> {
    let deleted = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(question_id)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

/// Restrict a query to rows the quiz can serve: a supported type and a known
/// difficulty. Difficulty is matched the way [`Difficulty::parse`] reads it.
fn push_servable(builder: &mut QueryBuilder<'_, Postgres>) {
    builder.push(" AND question_type IN (");
    let mut separated = builder.separated(", ");
    for question_type in QuestionType::SUPPORTED {
        separated.push_bind(question_type.as_str());
    }
    separated.push_unseparated(")");

    builder.push(" AND LOWER(TRIM(difficulty)) IN (");
    let mut separated = builder.separated(", ");
    for difficulty in Difficulty::ALL {
        separated.push_bind(difficulty.as_str());
    }
    separated.push_unseparated(")");
}

/// Decode listed rows, leaving out any that still fail to decode.
fn decode_rows(rows: Vec<QuestionRow>) -> Vec<Question> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            to_question(row)
                .inspect_err(|err| warn!(question_id = id, ?err, "skipping undecodable question"))
                .ok()
        })
        .collect()
}

fn to_question(row: QuestionRow) -> anyhow::Result<Question> {
    let question_type = QuestionType::parse(&row.question_type).with_context(|| {
        format!(
            "unsupported question_type `{}` on question {}",
            row.question_type, row.id
        )
    })?;
    let difficulty = Difficulty::parse(&row.difficulty).with_context(|| {
        format!("unknown difficulty `{}` on question {}", row.difficulty, row.id)
    })?;

    Ok(Question {
        id: row.id,
        question_text: row.question_text,
        question_type,
        options: decode_options(row.options.as_deref()),
        correct_answer: row.correct_answer,
        category: row.category,
        difficulty,
        hint: row.hint,
        level_required: row.level_required.max(1),
        time_limit: row.time_limit,
        created_by: row.created_by,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::{Postgres, QueryBuilder};

    use super::{QuestionRow, decode_rows, push_servable};
    use crate::model::question::Difficulty;

    fn row(id: i64, difficulty: &str) -> QuestionRow {
        QuestionRow {
            id,
            question_text: "What does a WAF filter?".to_owned(),
            question_type: "multiple_choice".to_owned(),
            options: Some(r#"["HTTP traffic","Power spikes"]"#.to_owned()),
            correct_answer: "HTTP traffic".to_owned(),
            category: "web".to_owned(),
            difficulty: difficulty.to_owned(),
            hint: None,
            level_required: 1,
            time_limit: 30,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unknown_difficulty_rows_are_skipped() {
        let questions = decode_rows(vec![row(1, "easy"), row(2, "legendary"), row(3, " Hard ")]);

        let ids: Vec<_> = questions.iter().map(|question| question.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(questions[1].difficulty, Difficulty::Hard);
    }

    #[test]
    fn servable_filter_covers_type_and_difficulty() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM questions WHERE TRUE");
        push_servable(&mut builder);

        let sql = builder.sql();
        assert!(sql.contains("question_type IN ($1, $2)"));
        assert!(sql.contains("LOWER(TRIM(difficulty)) IN ($3, $4, $5, $6)"));
    }
}
