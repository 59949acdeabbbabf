use chrono::{DateTime, Utc};
use cyberquest_database::{
    Database,
    impls::{
        levels::load_ladder,
        progress::{answer_totals, recent_progress},
    },
    model::{
        level::{Level, LevelLadder},
        progress::{AnswerTotals, RecentProgress},
        user::UserAccount,
    },
};
use cyberquest_utils::formatting::{accuracy_percent, excerpt};
use serde::Serialize;

use crate::accounts::AccountView;

const RECENT_LIMIT: i64 = 10;
const EXCERPT_CHARS: usize = 50;

#[derive(Clone, Debug, Serialize)]
pub struct RecentAnswer {
    pub id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub answered_correctly: bool,
    pub xp_earned: i64,
    pub answered_at: DateTime<Utc>,
}

impl From<RecentProgress> for RecentAnswer {
    fn from(progress: RecentProgress) -> Self {
        Self {
            id: progress.id,
            question_id: progress.question_id,
            question_text: excerpt(&progress.question_text, EXCERPT_CHARS),
            answered_correctly: progress.answered_correctly,
            xp_earned: progress.xp_earned,
            answered_at: progress.answered_at,
        }
    }
}

/// Progress figures shown on the dashboard and profile pages.
#[derive(Clone, Debug, Serialize)]
pub struct StatsSummary {
    pub total_xp: i64,
    pub questions_answered: i64,
    pub correct_answers: i64,
    pub accuracy: f64,
    pub current_level: i32,
    pub daily_streak: i32,
    pub level_info: Option<Level>,
    pub next_level: Option<Level>,
    pub xp_to_next_level: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserStats {
    pub user: AccountView,
    pub stats: StatsSummary,
    pub recent_progress: Vec<RecentAnswer>,
}

pub fn build_stats(
    ladder: &LevelLadder,
    account: &UserAccount,
    totals: AnswerTotals,
    recent: Vec<RecentProgress>,
) -> UserStats {
    let next_level = ladder.next_after(account.current_level).cloned();
    let xp_to_next_level = next_level
        .as_ref()
        .map(|level| (level.xp_required - account.total_xp).max(0));

    UserStats {
        user: AccountView::from(account.clone()),
        stats: StatsSummary {
            total_xp: account.total_xp,
            questions_answered: totals.total_answered,
            correct_answers: totals.correct_count,
            accuracy: accuracy_percent(totals.correct_count, totals.total_answered),
            current_level: account.current_level,
            daily_streak: account.daily_streak,
            level_info: ladder.get(account.current_level).cloned(),
            next_level,
            xp_to_next_level,
        },
        recent_progress: recent.into_iter().map(RecentAnswer::from).collect(),
    }
}

pub async fn user_stats(db: &Database, account: &UserAccount) -> anyhow::Result<UserStats> {
    let ladder = load_ladder(db).await?;
    let totals = answer_totals(db, account.id).await?;
    let recent = recent_progress(db, account.id, RECENT_LIMIT).await?;

    Ok(build_stats(&ladder, account, totals, recent))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cyberquest_database::model::{
        level::LevelLadder,
        progress::{AnswerTotals, RecentProgress},
        user::Role,
    };

    use super::build_stats;
    use crate::caller::tests::account;

    fn recent(text: &str) -> RecentProgress {
        RecentProgress {
            id: 1,
            question_id: 4,
            question_text: text.to_owned(),
            answered_correctly: true,
            xp_earned: 10,
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn stats_report_accuracy_and_next_level() {
        let stats = build_stats(
            &LevelLadder::defaults(),
            &account(Role::Learner, 180, 2),
            AnswerTotals {
                total_answered: 3,
                correct_count: 2,
            },
            vec![recent(
                "Which of these attacks abuses a trusted relationship between two hosts?",
            )],
        );

        assert_eq!(stats.stats.accuracy, 66.7);
        assert_eq!(stats.stats.level_info.as_ref().unwrap().name, "Novice");
        assert_eq!(stats.stats.next_level.as_ref().unwrap().level_number, 3);
        assert_eq!(stats.stats.xp_to_next_level, Some(70));

        let text = &stats.recent_progress[0].question_text;
        assert!(text.ends_with("..."));
        assert!(text.chars().count() <= 53);
    }

    #[test]
    fn top_level_has_no_next_level() {
        let stats = build_stats(
            &LevelLadder::defaults(),
            &account(Role::Learner, 4_000, 7),
            AnswerTotals::default(),
            vec![recent("What is a CVE?")],
        );

        assert!(stats.stats.next_level.is_none());
        assert!(stats.stats.xp_to_next_level.is_none());
        assert_eq!(stats.stats.accuracy, 0.0);
        assert_eq!(stats.recent_progress[0].question_text, "What is a CVE?");
    }

    #[test]
    fn stats_json_nests_figures_under_stats() {
        let stats = build_stats(
            &LevelLadder::defaults(),
            &account(Role::Learner, 180, 2),
            AnswerTotals {
                total_answered: 4,
                correct_count: 3,
            },
            vec![recent("What is a CVE?")],
        );
        let json = serde_json::to_value(&stats).unwrap();

        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["recent_progress", "stats", "user"]);

        assert_eq!(json["user"]["username"], "mallory");
        assert!(json["user"].get("password_hash").is_none());

        let figures = &json["stats"];
        assert_eq!(figures["total_xp"], 180);
        assert_eq!(figures["questions_answered"], 4);
        assert_eq!(figures["correct_answers"], 3);
        assert_eq!(figures["accuracy"], 75.0);
        assert_eq!(figures["current_level"], 2);
        assert_eq!(figures["daily_streak"], 0);
        assert_eq!(figures["level_info"]["name"], "Novice");
        assert_eq!(figures["next_level"]["level_number"], 3);
        assert_eq!(figures["xp_to_next_level"], 70);

        let recent = &json["recent_progress"][0];
        assert_eq!(recent["id"], 1);
        assert_eq!(recent["answered_correctly"], true);
        assert_eq!(recent["question_text"], "What is a CVE?");
    }
}
