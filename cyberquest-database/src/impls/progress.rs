use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::{
    database::Database,
    model::progress::{AnswerTotals, NewProgress, ProgressRecord, RecentProgress},
};

#[derive(sqlx::FromRow)]
struct ProgressRow {
    id: i64,
    user_id: i64,
    question_id: i64,
    answered_correctly: bool,
    xp_earned: i64,
    time_taken: Option<i32>,
    hints_used: i32,
    answered_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RecentProgressRow {
    id: i64,
    question_id: i64,
    question_text: String,
    answered_correctly: bool,
    xp_earned: i64,
    answered_at: DateTime<Utc>,
}

/// Append an answer record inside the caller's transaction.
pub async fn record_progress(
    conn: &mut PgConnection,
    progress: &NewProgress,
) -> anyhow::Result<ProgressRecord> {
    let row: ProgressRow = sqlx::query_as(
        "INSERT INTO user_progress
            (user_id, question_id, answered_correctly, xp_earned, time_taken, hints_used)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, user_id, question_id, answered_correctly, xp_earned, time_taken,
                   hints_used, answered_at",
    )
    .bind(progress.user_id)
    .bind(progress.question_id)
    .bind(progress.answered_correctly)
    .bind(progress.xp_earned)
    .bind(progress.time_taken)
    .bind(progress.hints_used)
    .fetch_one(&mut *conn)
    .await?;

    Ok(ProgressRecord {
        id: row.id,
        user_id: row.user_id,
        question_id: row.question_id,
        answered_correctly: row.answered_correctly,
        xp_earned: row.xp_earned,
        time_taken: row.time_taken,
        hints_used: row.hints_used,
        answered_at: row.answered_at,
    })
}

/// Whether the user has answered anything yet.
pub async fn has_history(db: &Database, user_id: i64) -> anyhow::Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_progress WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(db.pool())
            .await?;

    Ok(exists)
}

pub async fn answer_totals(db: &Database, user_id: i64) -> anyhow::Result<AnswerTotals> {
    let (total_answered, correct_count): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE answered_correctly)
         FROM user_progress
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(db.pool())
    .await?;

    Ok(AnswerTotals {
        total_answered,
        correct_count,
    })
}

/// Latest answers first.
pub async fn recent_progress(
    db: &Database,
    user_id: i64,
    limit: i64,
) -> anyhow::Result<Vec<RecentProgress>> {
    let rows: Vec<RecentProgressRow> = sqlx::query_as(
        "SELECT up.id, up.question_id, q.question_text, up.answered_correctly, up.xp_earned,
                up.answered_at
         FROM user_progress up
         JOIN questions q ON up.question_id = q.id
         WHERE up.user_id = $1
         ORDER BY up.answered_at DESC, up.id DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RecentProgress {
            id: row.id,
            question_id: row.question_id,
            question_text: row.question_text,
            answered_correctly: row.answered_correctly,
            xp_earned: row.xp_earned,
            answered_at: row.answered_at,
        })
        .collect())
}
