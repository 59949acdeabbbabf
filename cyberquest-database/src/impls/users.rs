use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use crate::{
    database::Database,
    model::user::{AccountConflict, NewUser, Role, StoredCredentials, UserAccount},
};

const USER_COLUMNS: &str = "id, username, email, total_xp, role, current_level, daily_streak, \
                            last_activity_date, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    total_xp: i64,
    role: Option<String>,
    current_level: Option<i32>,
    daily_streak: Option<i32>,
    last_activity_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: i64,
    username: String,
    password_hash: String,
}

/// Report which unique field an incoming registration would collide with.
pub async fn find_account_conflict(
    db: &Database,
    username: &str,
    email: &str,
) -> anyhow::Result<Option<AccountConflict>> {
    let row: Option<(String, String)> = sqlx::query_as(
        "SELECT username, email FROM users WHERE username = $1 OR email = $2 LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .fetch_optional(db.pool())
    .await?;

    Ok(row.map(|(existing_username, _)| {
        if existing_username == username {
            AccountConflict::Username
        } else {
            AccountConflict::Email
        }
    }))
}

/// Insert a user with zero XP at level 1. Returns `None` when the username or
/// email was claimed concurrently.
pub async fn create_user(
    db: &Database,
    new_user: NewUser<'_>,
) -> anyhow::Result<Option<UserAccount>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "INSERT INTO users
            (username, email, password_hash, role, total_xp, current_level, daily_streak)
         VALUES ($1, $2, $3, $4, 0, 1, 0)
         ON CONFLICT DO NOTHING
         RETURNING {USER_COLUMNS}"
    ))
    .bind(new_user.username)
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(new_user.role.as_str())
    .fetch_optional(db.pool())
    .await?;

    row.map(to_user_account).transpose()
}

pub async fn get_user(db: &Database, user_id: i64) -> anyhow::Result<Option<UserAccount>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?;

    row.map(to_user_account).transpose()
}

pub async fn get_credentials_by_username(
    db: &Database,
    username: &str,
) -> anyhow::Result<Option<StoredCredentials>> {
    let row: Option<CredentialsRow> =
        sqlx::query_as("SELECT id, username, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(db.pool())
            .await?;

    Ok(row.map(|row| StoredCredentials {
        user_id: row.id,
        username: row.username,
        password_hash: row.password_hash,
    }))
}

/// Fill role, level and streak on rows created before those columns existed.
pub async fn backfill_legacy_defaults(db: &Database, user_id: i64) -> anyhow::Result<bool> {
    let updated = sqlx::query(
        "UPDATE users
         SET role = COALESCE(role, 'learner'),
             current_level = COALESCE(current_level, 1),
             daily_streak = COALESCE(daily_streak, 0)
         WHERE id = $1 AND (role IS NULL OR current_level IS NULL OR daily_streak IS NULL)",
    )
    .bind(user_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Raise an admin account to at least `min_xp` and `min_level`.
pub async fn apply_admin_floor(
    db: &Database,
    user_id: i64,
    min_xp: i64,
    min_level: i32,
) -> anyhow::Result<bool> {
    let updated = sqlx::query(
        "UPDATE users
         SET total_xp = GREATEST(total_xp, $2),
             current_level = GREATEST(COALESCE(current_level, 1), $3)
         WHERE id = $1 AND role = 'admin'
           AND (total_xp < $2 OR COALESCE(current_level, 1) < $3)",
    )
    .bind(user_id)
    .bind(min_xp)
    .bind(min_level)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// All users, highest XP first.
pub async fn list_users(db: &Database) -> anyhow::Result<Vec<UserAccount>> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY total_xp DESC, id ASC"
    ))
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(to_user_account).collect()
}

pub async fn set_role(db: &Database, user_id: i64, role: Role) -> anyhow::Result<bool> {
    let updated = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role.as_str())
        .bind(user_id)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(updated > 0)
}

/// Delete a user. Progress rows and authored questions go with it through
/// the foreign keys.
pub async fn delete_user(db: &Database, user_id: i64) -> anyhow::Result<bool> {
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

/// Create the bootstrap admin, or promote and re-key an existing account with
/// the same username.
pub async fn upsert_admin(
    db: &Database,
    username: &str,
    email: &str,
    password_hash: &str,
) -> anyhow::Result<UserAccount> {
    let row: UserRow = sqlx::query_as(&format!(
        "INSERT INTO users
            (username, email, password_hash, role, total_xp, current_level, daily_streak)
         VALUES ($1, $2, $3, 'admin', 0, 1, 0)
         ON CONFLICT (username) DO UPDATE
         SET role = 'admin', password_hash = EXCLUDED.password_hash
         RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(db.pool())
    .await?;

    to_user_account(row)
}

// ---------------------------------------------------------------------------
// Transaction-scoped helpers used by answer submission
// ---------------------------------------------------------------------------

/// Load a user and hold its row lock until the surrounding transaction ends.
pub async fn lock_user(
    conn: &mut PgConnection,
    user_id: i64,
) -> anyhow::Result<Option<UserAccount>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(to_user_account).transpose()
}

/// Atomically add XP and return the new total.
pub async fn add_xp(conn: &mut PgConnection, user_id: i64, xp: i64) -> anyhow::Result<i64> {
    let total_xp: i64 = sqlx::query_scalar(
        "UPDATE users SET total_xp = total_xp + $1 WHERE id = $2 RETURNING total_xp",
    )
    .bind(xp)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .context("failed to add xp")?;

    Ok(total_xp)
}

pub async fn set_streak(
    conn: &mut PgConnection,
    user_id: i64,
    daily_streak: i32,
    activity_date: NaiveDate,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET daily_streak = $1, last_activity_date = $2 WHERE id = $3")
        .bind(daily_streak)
        .bind(activity_date)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Persist a recomputed level. Never lowers the stored value.
pub async fn raise_level(
    conn: &mut PgConnection,
    user_id: i64,
    level: i32,
) -> anyhow::Result<bool> {
    let updated = sqlx::query(
        "UPDATE users SET current_level = $1
         WHERE id = $2 AND COALESCE(current_level, 1) < $1",
    )
    .bind(level)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(updated > 0)
}

fn to_user_account(row: UserRow) -> anyhow::Result<UserAccount> {
    let role = match row.role.as_deref() {
        None => Role::Learner,
        Some(raw) => {
            Role::parse(raw).with_context(|| format!("unknown role `{raw}` on user {}", row.id))?
        }
    };

    Ok(UserAccount {
        id: row.id,
        username: row.username,
        email: row.email,
        total_xp: row.total_xp,
        role,
        current_level: row.current_level.unwrap_or(1).max(1),
        daily_streak: row.daily_streak.unwrap_or(0).max(0),
        last_activity_date: row.last_activity_date,
        created_at: row.created_at,
    })
}
