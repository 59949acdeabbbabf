use crate::{database::Database, model::user::LeaderboardEntry};

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    id: i64,
    username: String,
    total_xp: i64,
    current_level: Option<i32>,
}

/// Non-admin users by XP, highest first.
pub async fn top_learners(db: &Database, limit: u32) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let limit_i64 = i64::from(limit);

    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        "SELECT id, username, total_xp, current_level
         FROM users
         WHERE role IS NULL OR role <> 'admin'
         ORDER BY total_xp DESC, id ASC
         LIMIT $1",
    )
    .bind(limit_i64)
    .fetch_all(db.pool())
    .await?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: index + 1,
            id: row.id,
            username: row.username,
            total_xp: row.total_xp,
            current_level: row.current_level.unwrap_or(1),
        })
        .collect())
}
