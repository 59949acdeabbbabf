use cyberquest_database::{
    impls::users::raise_level,
    model::{
        level::{Level, LevelLadder},
        user::UserAccount,
    },
};
use cyberquest_utils::formatting::progress_percent;
use serde::Serialize;
use sqlx::PgConnection;

use crate::caller::LevelGate;

/// XP an admin account is raised to at login.
pub const ADMIN_XP_FLOOR: i64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelSync {
    pub level: i32,
    pub leveled_up: bool,
}

/// Level after reaching `total_xp`. The stored level is never lowered.
pub fn sync_level(ladder: &LevelLadder, total_xp: i64, stored_level: i32) -> LevelSync {
    let computed = ladder.level_for_xp(total_xp);
    if computed > stored_level {
        LevelSync {
            level: computed,
            leveled_up: true,
        }
    } else {
        LevelSync {
            level: stored_level,
            leveled_up: false,
        }
    }
}

/// Recompute the level for `total_xp` and persist it when it went up. Safe
/// to call after any XP change; repeated calls with the same XP are no-ops.
pub async fn persist_level(
    conn: &mut PgConnection,
    ladder: &LevelLadder,
    user_id: i64,
    total_xp: i64,
    stored_level: i32,
) -> anyhow::Result<LevelSync> {
    let sync = sync_level(ladder, total_xp, stored_level);
    if sync.leveled_up {
        raise_level(conn, user_id, sync.level).await?;
    }
    Ok(sync)
}

/// Minimum level an admin account is kept at: the top of the ladder.
pub fn admin_level_floor(ladder: &LevelLadder) -> i32 {
    ladder.top().map_or(1, |level| level.level_number)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelStatus {
    #[serde(flatten)]
    pub level: Level,
    pub question_count: i64,
    pub is_unlocked: bool,
    pub is_current_level: bool,
    pub xp_progress: f64,
}

/// Per-level unlock status for an account. `counts_by_level` holds the
/// number of supported questions per `level_required`; a level's count
/// includes every question up to and including it.
pub fn level_overview(
    ladder: &LevelLadder,
    account: &UserAccount,
    counts_by_level: &[(i32, i64)],
) -> Vec<LevelStatus> {
    let gate = LevelGate::for_account(account);

    ladder
        .levels()
        .iter()
        .map(|level| {
            let question_count = counts_by_level
                .iter()
                .filter(|(level_required, _)| *level_required <= level.level_number)
                .map(|(_, count)| *count)
                .sum();
            let is_unlocked = gate.is_unlocked(level.xp_required);
            let xp_progress = if is_unlocked {
                100.0
            } else {
                progress_percent(account.total_xp, level.xp_required)
            };

            LevelStatus {
                level: level.clone(),
                question_count,
                is_unlocked,
                is_current_level: account.current_level == level.level_number,
                xp_progress,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cyberquest_database::model::{level::LevelLadder, user::Role};

    use super::{admin_level_floor, level_overview, sync_level};
    use crate::caller::tests::account;

    #[test]
    fn crossing_a_threshold_levels_up() {
        let ladder = LevelLadder::defaults();
        let sync = sync_level(&ladder, 105, 1);
        assert_eq!(sync.level, 2);
        assert!(sync.leveled_up);
    }

    #[test]
    fn stored_level_is_never_lowered() {
        let ladder = LevelLadder::defaults();
        let sync = sync_level(&ladder, 50, 4);
        assert_eq!(sync.level, 4);
        assert!(!sync.leveled_up);
    }

    #[test]
    fn sync_is_idempotent() {
        let ladder = LevelLadder::defaults();
        let first = sync_level(&ladder, 1_200, 1);
        let again = sync_level(&ladder, 1_200, first.level);
        assert_eq!(first.level, 5);
        assert_eq!(again.level, 5);
        assert!(!again.leveled_up);
    }

    #[test]
    fn admin_floor_is_top_level() {
        assert_eq!(admin_level_floor(&LevelLadder::defaults()), 7);
        assert_eq!(admin_level_floor(&LevelLadder::new(Vec::new())), 1);
    }

    #[test]
    fn overview_reports_unlocks_and_progress() {
        let ladder = LevelLadder::defaults();
        let learner = account(Role::Learner, 125, 2);
        let counts = [(1, 10), (2, 4), (3, 6)];

        let overview = level_overview(&ladder, &learner, &counts);
        assert_eq!(overview.len(), 7);

        assert!(overview[0].is_unlocked);
        assert_eq!(overview[0].question_count, 10);
        assert!(overview[1].is_unlocked);
        assert!(overview[1].is_current_level);
        assert_eq!(overview[1].xp_progress, 100.0);
        assert_eq!(overview[1].question_count, 14);

        assert!(!overview[2].is_unlocked);
        assert_eq!(overview[2].question_count, 20);
        assert_eq!(overview[2].xp_progress, 50.0);
        assert_eq!(overview[6].question_count, 20);
    }

    #[test]
    fn admins_see_everything_unlocked() {
        let ladder = LevelLadder::defaults();
        let admin = account(Role::Admin, 0, 1);
        let overview = level_overview(&ladder, &admin, &[]);
        assert!(overview.iter().all(|status| status.is_unlocked));
        assert!(overview.iter().all(|status| status.xp_progress == 100.0));
    }
}
