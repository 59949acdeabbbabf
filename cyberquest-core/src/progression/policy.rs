use std::{fs, path::Path};

use anyhow::Context as _;
use cyberquest_database::model::question::Difficulty;
use serde::{Deserialize, Serialize};

/// Base XP per difficulty before level scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseXp {
    pub easy: i64,
    pub medium: i64,
    pub hard: i64,
    pub very_hard: i64,
}

impl Default for BaseXp {
    fn default() -> Self {
        Self {
            easy: 10,
            medium: 20,
            hard: 30,
            very_hard: 50,
        }
    }
}

/// Scoring tables for answer submission.
///
/// `level_multipliers[0]` applies to level 1, `[1]` to level 2 and so on.
/// Levels outside the table, including non-positive ones, use the level 1
/// multiplier. The defaults are tuned so that ten correct answers at a level
/// roughly cover the XP gap to the next one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpPolicy {
    pub base_xp: BaseXp,
    pub level_multipliers: Vec<f64>,
    pub hint_penalty: i64,
    pub time_limit_ceiling_secs: i32,
}

impl Default for XpPolicy {
    fn default() -> Self {
        Self {
            base_xp: BaseXp::default(),
            level_multipliers: vec![1.0, 1.5, 1.25, 2.5, 3.33, 3.0, 3.0],
            hint_penalty: 2,
            time_limit_ceiling_secs: 30,
        }
    }
}

impl XpPolicy {
    /// Load an override from a JSON file. Omitted keys keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read xp policy from {}", path.display()))?;
        let policy: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse xp policy in {}", path.display()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base = [
            self.base_xp.easy,
            self.base_xp.medium,
            self.base_xp.hard,
            self.base_xp.very_hard,
        ];
        anyhow::ensure!(
            base.iter().all(|xp| *xp >= 0),
            "base xp values must not be negative"
        );
        anyhow::ensure!(
            !self.level_multipliers.is_empty(),
            "level_multipliers needs at least the level 1 entry"
        );
        anyhow::ensure!(
            self.level_multipliers
                .iter()
                .all(|multiplier| multiplier.is_finite() && *multiplier > 0.0),
            "level multipliers must be positive finite numbers"
        );
        anyhow::ensure!(self.hint_penalty >= 0, "hint_penalty must not be negative");
        anyhow::ensure!(
            self.time_limit_ceiling_secs > 0,
            "time_limit_ceiling_secs must be positive"
        );
        Ok(())
    }

    pub fn base_xp(&self, difficulty: Difficulty) -> i64 {
        match difficulty {
            Difficulty::Easy => self.base_xp.easy,
            Difficulty::Medium => self.base_xp.medium,
            Difficulty::Hard => self.base_xp.hard,
            Difficulty::VeryHard => self.base_xp.very_hard,
        }
    }

    pub fn multiplier(&self, level: i32) -> f64 {
        let floor = self.level_multipliers.first().copied().unwrap_or(1.0);
        if level < 1 {
            return floor;
        }

        usize::try_from(level - 1)
            .ok()
            .and_then(|index| self.level_multipliers.get(index).copied())
            .unwrap_or(floor)
    }

    /// XP for a correct answer before any hint penalty.
    pub fn scaled_xp(&self, difficulty: Difficulty, level: i32) -> i64 {
        (self.base_xp(difficulty) as f64 * self.multiplier(level)).round() as i64
    }

    /// XP for an answer: zero when wrong, otherwise the scaled XP minus the
    /// hint penalty, never below zero.
    pub fn award(&self, correct: bool, difficulty: Difficulty, level: i32, hints_used: i32) -> i64 {
        if !correct {
            return 0;
        }

        let penalty = self
            .hint_penalty
            .saturating_mul(i64::from(hints_used.max(0)));
        self.scaled_xp(difficulty, level)
            .saturating_sub(penalty)
            .max(0)
    }

    /// Time limit shown to the client for a stored limit.
    pub fn display_time_limit(&self, stored_secs: i32) -> i32 {
        if stored_secs <= 0 {
            return self.time_limit_ceiling_secs;
        }
        stored_secs.min(self.time_limit_ceiling_secs)
    }
}
