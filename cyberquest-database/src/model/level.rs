use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Level {
    pub level_number: i32,
    pub name: String,
    pub xp_required: i64,
    pub description: Option<String>,
}

/// Seed rows for the `levels` table: (number, name, xp required, description).
pub const DEFAULT_LEVELS: &[(i32, &str, i64, &str)] = &[
    (1, "Beginner", 0, "Start your cybersecurity journey"),
    (2, "Novice", 100, "You are learning the basics"),
    (3, "Intermediate", 250, "Building your skills"),
    (4, "Advanced", 500, "Mastering cybersecurity"),
    (5, "Expert", 1000, "Cybersecurity professional"),
    (6, "Master", 2000, "Advanced cybersecurity expert"),
    (7, "Grandmaster", 3500, "Elite cybersecurity specialist"),
];

/// The level table ordered by `level_number`.
///
/// Thresholds are strictly increasing and level 1 starts at 0 XP, so the
/// level for any XP total is the last entry whose threshold it reaches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LevelLadder {
    levels: Vec<Level>,
}

impl LevelLadder {
    pub fn new(mut levels: Vec<Level>) -> Self {
        levels.sort_by_key(|level| level.level_number);
        Self { levels }
    }

    pub fn defaults() -> Self {
        Self::new(
            DEFAULT_LEVELS
                .iter()
                .map(|(level_number, name, xp_required, description)| Level {
                    level_number: *level_number,
                    name: (*name).to_owned(),
                    xp_required: *xp_required,
                    description: Some((*description).to_owned()),
                })
                .collect(),
        )
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn get(&self, level_number: i32) -> Option<&Level> {
        self.levels
            .iter()
            .find(|level| level.level_number == level_number)
    }

    pub fn next_after(&self, level_number: i32) -> Option<&Level> {
        self.levels
            .iter()
            .find(|level| level.level_number > level_number)
    }

    pub fn top(&self) -> Option<&Level> {
        self.levels.last()
    }

    /// Highest level whose threshold `total_xp` reaches. Falls back to 1
    /// when the ladder is empty.
    pub fn level_for_xp(&self, total_xp: i64) -> i32 {
        self.levels
            .iter()
            .filter(|level| level.xp_required <= total_xp)
            .map(|level| level.level_number)
            .max()
            .unwrap_or(1)
    }
}
