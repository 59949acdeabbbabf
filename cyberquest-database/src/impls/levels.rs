use crate::{
    database::Database,
    model::level::{DEFAULT_LEVELS, Level, LevelLadder},
};

/// Insert the default ladder. Existing level numbers are left untouched, so
/// this is safe to run on every start.
pub async fn seed_default_levels(db: &Database) -> anyhow::Result<u64> {
    let mut inserted = 0;

    for &(level_number, name, xp_required, description) in DEFAULT_LEVELS {
        inserted += sqlx::query(
            "INSERT INTO levels (level_number, name, xp_required, description)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (level_number) DO NOTHING",
        )
        .bind(level_number)
        .bind(name)
        .bind(xp_required)
        .bind(description)
        .execute(db.pool())
        .await?
        .rows_affected();
    }

    Ok(inserted)
}

pub async fn load_ladder(db: &Database) -> anyhow::Result<LevelLadder> {
    let levels: Vec<Level> = sqlx::query_as(
        "SELECT level_number, name, xp_required, description
         FROM levels
         ORDER BY level_number ASC",
    )
    .fetch_all(db.pool())
    .await?;

    Ok(LevelLadder::new(levels))
}
