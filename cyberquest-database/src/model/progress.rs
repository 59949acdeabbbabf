use chrono::{DateTime, Utc};
use serde::Serialize;

/// One immutable answer record.
#[derive(Clone, Debug, Serialize)]
pub struct ProgressRecord {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub answered_correctly: bool,
    pub xp_earned: i64,
    pub time_taken: Option<i32>,
    pub hints_used: i32,
    pub answered_at: DateTime<Utc>,
}

pub struct NewProgress {
    pub user_id: i64,
    pub question_id: i64,
    pub answered_correctly: bool,
    pub xp_earned: i64,
    pub time_taken: Option<i32>,
    pub hints_used: i32,
}

/// Progress row joined with the text of the question it answers.
#[derive(Clone, Debug, Serialize)]
pub struct RecentProgress {
    pub id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub answered_correctly: bool,
    pub xp_earned: i64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnswerTotals {
    pub total_answered: i64,
    pub correct_count: i64,
}
