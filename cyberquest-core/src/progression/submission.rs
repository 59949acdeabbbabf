use anyhow::Context as _;
use chrono::NaiveDate;
use cyberquest_database::{
    Database,
    impls::{
        levels::load_ladder,
        progress::record_progress,
        questions::get_supported_question,
        users::{add_xp, lock_user, set_streak},
    },
    model::{level::LevelLadder, progress::NewProgress, question::Question, user::UserAccount},
};
use cyberquest_utils::parse::answers_match;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    caller::LevelGate,
    error::{ApiError, ApiResult, FieldError},
    progression::{
        leveling::{LevelSync, persist_level, sync_level},
        policy::XpPolicy,
        streak::{StreakUpdate, next_streak},
    },
};

/// Body of `POST /api/quiz/submit`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubmissionBody {
    pub question_id: Option<i64>,
    #[serde(default)]
    pub answer: Value,
    pub time_taken: Option<i64>,
    pub hints_used: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub answer: String,
    pub time_taken: Option<i32>,
    pub hints_used: i32,
}

impl SubmissionBody {
    pub fn validate(self) -> ApiResult<AnswerSubmission> {
        let mut errors = Vec::new();

        if self.question_id.is_none() {
            errors.push(FieldError::new("question_id", "question_id is required"));
        }

        let answer = match self.answer {
            Value::String(answer) => Some(answer),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Null => {
                errors.push(FieldError::new("answer", "answer is required"));
                None
            }
            Value::Array(_) | Value::Object(_) => {
                errors.push(FieldError::new("answer", "answer must be a string"));
                None
            }
        };

        let time_taken = match self.time_taken {
            None => None,
            Some(secs) if secs < 0 => {
                errors.push(FieldError::new("time_taken", "time_taken must not be negative"));
                None
            }
            Some(secs) => Some(i32::try_from(secs).unwrap_or(i32::MAX)),
        };

        let hints_used = match self.hints_used {
            None => 0,
            Some(hints) if hints < 0 => {
                errors.push(FieldError::new("hints_used", "hints_used must not be negative"));
                0
            }
            Some(hints) => i32::try_from(hints).unwrap_or(i32::MAX),
        };

        match (self.question_id, answer) {
            (Some(question_id), Some(answer)) if errors.is_empty() => Ok(AnswerSubmission {
                question_id,
                answer,
                time_taken,
                hints_used,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

/// Exact match after trimming and lower-casing both sides.
pub fn is_correct_answer(correct_answer: &str, submitted: &str) -> bool {
    answers_match(correct_answer, submitted)
}

/// Everything a submission changes, computed from plain values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionPlan {
    pub is_correct: bool,
    pub xp_earned: i64,
    pub total_xp: i64,
    pub streak: StreakUpdate,
    pub daily_streak: i32,
    pub level: LevelSync,
}

pub fn plan_submission(
    policy: &XpPolicy,
    ladder: &LevelLadder,
    question: &Question,
    account: &UserAccount,
    submission: &AnswerSubmission,
    today: NaiveDate,
) -> ApiResult<SubmissionPlan> {
    LevelGate::for_account(account).check_question_level(question.level_required)?;

    let is_correct = is_correct_answer(&question.correct_answer, &submission.answer);
    let xp_earned = policy.award(
        is_correct,
        question.difficulty,
        question.level_required,
        submission.hints_used,
    );
    let total_xp = account.total_xp.saturating_add(xp_earned);

    let streak = next_streak(account.last_activity_date, account.daily_streak, today);
    let daily_streak = match streak {
        StreakUpdate::Unchanged => account.daily_streak,
        StreakUpdate::Set(streak) => streak,
    };

    Ok(SubmissionPlan {
        is_correct,
        xp_earned,
        total_xp,
        streak,
        daily_streak,
        level: sync_level(ladder, total_xp, account.current_level),
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub is_correct: bool,
    pub xp_earned: i64,
    pub correct_answer: String,
    pub total_xp: i64,
    pub current_level: i32,
    pub daily_streak: i32,
    pub level_up: bool,
}

/// Grade an answer and apply its XP, streak, level and history changes in
/// one transaction. The caller's user row stays locked until commit, so one
/// user's submissions are applied one after another.
pub async fn submit_answer(
    db: &Database,
    policy: &XpPolicy,
    user_id: i64,
    submission: &AnswerSubmission,
    today: NaiveDate,
) -> ApiResult<SubmissionOutcome> {
    let question = get_supported_question(db, submission.question_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_owned()))?;
    let ladder = load_ladder(db).await?;

    let mut tx = db
        .pool()
        .begin()
        .await
        .context("failed to start submission transaction")?;

    let account = lock_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;
    let plan = plan_submission(policy, &ladder, &question, &account, submission, today)?;

    let total_xp = if plan.xp_earned > 0 {
        add_xp(&mut *tx, user_id, plan.xp_earned).await?
    } else {
        account.total_xp
    };

    if let StreakUpdate::Set(streak) = plan.streak {
        set_streak(&mut *tx, user_id, streak, today).await?;
    }

    let level = persist_level(&mut *tx, &ladder, user_id, total_xp, account.current_level).await?;

    record_progress(
        &mut *tx,
        &NewProgress {
            user_id,
            question_id: question.id,
            answered_correctly: plan.is_correct,
            xp_earned: plan.xp_earned,
            time_taken: submission.time_taken,
            hints_used: submission.hints_used,
        },
    )
    .await?;

    tx.commit()
        .await
        .context("failed to commit submission transaction")?;

    info!(
        user_id,
        question_id = question.id,
        correct = plan.is_correct,
        xp = plan.xp_earned,
        total_xp,
        level = level.level,
        level_up = level.leveled_up,
        "answer recorded"
    );

    Ok(SubmissionOutcome {
        is_correct: plan.is_correct,
        xp_earned: plan.xp_earned,
        correct_answer: question.correct_answer,
        total_xp,
        current_level: level.level,
        daily_streak: plan.daily_streak,
        level_up: level.leveled_up,
    })
}
