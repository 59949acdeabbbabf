use cyberquest_database::{
    Database,
    impls::{
        levels::load_ladder,
        progress::has_history,
        questions::{LevelScope, QuestionFilter, candidate_questions},
    },
    model::{
        level::LevelLadder,
        question::{Difficulty, Question, QuestionType},
    },
};
use cyberquest_utils::parse::{coerce_level, non_blank};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    caller::{Access, LevelGate},
    error::{ApiError, ApiResult},
    progression::policy::XpPolicy,
};

/// Raw `GET /api/quiz` query.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuizQuery {
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizRequest {
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub level: Option<i32>,
}

impl QuizQuery {
    pub fn parse(&self) -> ApiResult<QuizRequest> {
        let difficulty = match non_blank(self.difficulty.as_deref()) {
            None => None,
            Some(raw) => Some(Difficulty::parse(raw).ok_or_else(|| {
                ApiError::field(
                    "difficulty",
                    "difficulty must be one of easy, medium, hard, very_hard",
                )
            })?),
        };

        Ok(QuizRequest {
            difficulty,
            category: non_blank(self.category.as_deref()).map(str::to_owned),
            level: non_blank(self.level.as_deref()).map(coerce_level),
        })
    }
}

/// Where a selection draws from once the level policy has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionScope {
    pub level: LevelScope,
    pub difficulty: Option<Difficulty>,
}

impl SelectionScope {
    fn level_number(&self) -> i32 {
        match self.level {
            LevelScope::Exactly(level) | LevelScope::UpTo(level) => level,
        }
    }
}

/// Apply the level policy. An explicit level needs enough XP to have been
/// unlocked and draws from that level only, across all difficulties.
/// Without one the caller gets everything up to their current level at the
/// requested difficulty, medium by default.
pub fn resolve_scope(
    ladder: &LevelLadder,
    gate: LevelGate,
    current_level: i32,
    request: &QuizRequest,
) -> ApiResult<SelectionScope> {
    match request.level {
        Some(level_number) => {
            let level = ladder
                .get(level_number)
                .ok_or_else(|| ApiError::NotFound(format!("Level {level_number} not found")))?;
            gate.check_level_unlock(level.level_number, level.xp_required)?;

            Ok(SelectionScope {
                level: LevelScope::Exactly(level.level_number),
                difficulty: None,
            })
        }
        None => Ok(SelectionScope {
            level: LevelScope::UpTo(current_level.max(1)),
            difficulty: Some(request.difficulty.unwrap_or(Difficulty::Medium)),
        }),
    }
}

/// Question as served to a learner: no answer, no hint text.
///
/// `hint` only says whether a hint exists; the text itself comes from the
/// hint route so that using it is reported on submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub category: String,
    pub difficulty: Difficulty,
    pub level_required: i32,
    pub time_limit: i32,
    #[serde(rename = "hint")]
    pub has_hint: bool,
}

impl QuizQuestion {
    pub fn from_question(question: Question, policy: &XpPolicy) -> Self {
        let has_hint = question
            .hint
            .as_deref()
            .is_some_and(|hint| !hint.trim().is_empty());

        Self {
            id: question.id,
            question_text: question.question_text,
            question_type: question.question_type,
            options: question.options,
            category: question.category,
            difficulty: question.difficulty,
            level_required: question.level_required,
            time_limit: policy.display_time_limit(question.time_limit),
            has_hint,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QuizSelection {
    pub question: QuizQuestion,
    /// Unanswered questions left in scope, including this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<usize>,
    /// Set when every question in scope had been answered and this one is a
    /// repeat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_answered: Option<bool>,
}

fn pick_random(mut candidates: Vec<Question>) -> Option<Question> {
    if candidates.is_empty() {
        return None;
    }

    let chosen = rand::thread_rng().gen_range(0..candidates.len());
    Some(candidates.swap_remove(chosen))
}

/// Decide what to serve from the two candidate pools. Unanswered questions
/// win; repeats are only drawn when none are left, and `all_answered` is
/// only reported to callers with answer history.
pub fn choose_question(
    policy: &XpPolicy,
    unanswered: Vec<Question>,
    repeats: Vec<Question>,
    has_history: bool,
    level: i32,
) -> ApiResult<QuizSelection> {
    let remaining = unanswered.len();
    if let Some(question) = pick_random(unanswered) {
        return Ok(QuizSelection {
            question: QuizQuestion::from_question(question, policy),
            remaining: Some(remaining),
            all_answered: None,
        });
    }

    let question = pick_random(repeats).ok_or_else(|| {
        ApiError::NotFound(format!("No questions available for level {level}"))
    })?;

    Ok(QuizSelection {
        question: QuizQuestion::from_question(question, policy),
        remaining: None,
        all_answered: has_history.then_some(true),
    })
}

/// Pick one eligible question for the caller, preferring questions they
/// have not answered yet.
pub async fn select_question(
    db: &Database,
    policy: &XpPolicy,
    access: &Access,
    request: &QuizRequest,
) -> ApiResult<QuizSelection> {
    let ladder = load_ladder(db).await?;
    let account = access.account();
    let scope = resolve_scope(&ladder, access.level_gate(), account.current_level, request)?;
    let level = scope.level_number();

    let mut filter = QuestionFilter {
        level: scope.level,
        difficulty: scope.difficulty,
        category: request.category.as_deref(),
        exclude_answered_by: Some(account.id),
    };

    let unanswered = candidate_questions(db, &filter).await?;
    let (repeats, answered_before) = if unanswered.is_empty() {
        filter.exclude_answered_by = None;
        let repeats = candidate_questions(db, &filter).await?;
        debug!(
            user_id = account.id,
            level,
            candidates = repeats.len(),
            "no unanswered questions in scope"
        );
        (repeats, has_history(db, account.id).await?)
    } else {
        (Vec::new(), false)
    };

    choose_question(policy, unanswered, repeats, answered_before, level)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cyberquest_database::{
        impls::questions::LevelScope,
        model::{
            level::LevelLadder,
            question::{Difficulty, Question, QuestionType},
            user::Role,
        },
    };

    use super::{
        QuizQuery, QuizQuestion, QuizRequest, choose_question, pick_random, resolve_scope,
    };
    use crate::{
        caller::{LevelGate, tests::account},
        error::ApiError,
        progression::policy::XpPolicy,
    };

    fn question(id: i64, time_limit: i32, hint: Option<&str>) -> Question {
        Question {
            id,
            question_text: "What does TLS protect?".to_owned(),
            question_type: QuestionType::MultipleChoice,
            options: Some(vec!["Data in transit".to_owned(), "Data at rest".to_owned()]),
            correct_answer: "Data in transit".to_owned(),
            category: "cryptography".to_owned(),
            difficulty: Difficulty::Easy,
            hint: hint.map(str::to_owned),
            level_required: 1,
            time_limit,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn query_parsing() {
        let query = QuizQuery {
            difficulty: Some("Hard".to_owned()),
            category: Some("  ".to_owned()),
            level: Some("3".to_owned()),
        };
        assert_eq!(
            query.parse().unwrap(),
            QuizRequest {
                difficulty: Some(Difficulty::Hard),
                category: None,
                level: Some(3),
            }
        );

        let bad = QuizQuery {
            difficulty: Some("impossible".to_owned()),
            ..QuizQuery::default()
        };
        assert!(matches!(bad.parse(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn implicit_level_uses_current_level_and_medium() {
        let ladder = LevelLadder::defaults();
        let learner = account(Role::Learner, 300, 3);
        let scope = resolve_scope(
            &ladder,
            LevelGate::for_account(&learner),
            learner.current_level,
            &QuizRequest::default(),
        )
        .unwrap();

        assert_eq!(scope.level, LevelScope::UpTo(3));
        assert_eq!(scope.difficulty, Some(Difficulty::Medium));
    }

    #[test]
    fn explicit_level_ignores_difficulty() {
        let ladder = LevelLadder::defaults();
        let learner = account(Role::Learner, 300, 3);
        let request = QuizRequest {
            difficulty: Some(Difficulty::Easy),
            category: None,
            level: Some(2),
        };
        let scope =
            resolve_scope(&ladder, LevelGate::for_account(&learner), 3, &request).unwrap();

        assert_eq!(scope.level, LevelScope::Exactly(2));
        assert_eq!(scope.difficulty, None);
    }

    #[test]
    fn locked_level_reports_shortfall_unless_admin() {
        let ladder = LevelLadder::defaults();
        let request = QuizRequest {
            level: Some(3),
            ..QuizRequest::default()
        };

        let learner = account(Role::Learner, 120, 2);
        let Err(ApiError::Forbidden(message)) =
            resolve_scope(&ladder, LevelGate::for_account(&learner), 2, &request)
        else {
            panic!("expected forbidden");
        };
        assert!(message.contains("130 XP short"));

        let admin = account(Role::Admin, 0, 1);
        let scope = resolve_scope(&ladder, LevelGate::for_account(&admin), 1, &request).unwrap();
        assert_eq!(scope.level, LevelScope::Exactly(3));
    }

    #[test]
    fn unknown_level_is_not_found() {
        let ladder = LevelLadder::defaults();
        let request = QuizRequest {
            level: Some(12),
            ..QuizRequest::default()
        };
        let admin = account(Role::Admin, 0, 1);
        assert!(matches!(
            resolve_scope(&ladder, LevelGate::for_account(&admin), 1, &request),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn served_question_caps_time_and_hides_hint() {
        let policy = XpPolicy::default();
        let served =
            QuizQuestion::from_question(question(1, 120, Some("Think transport")), &policy);
        assert_eq!(served.time_limit, 30);
        assert!(served.has_hint);

        let served = QuizQuestion::from_question(question(2, 15, Some("  ")), &policy);
        assert_eq!(served.time_limit, 15);
        assert!(!served.has_hint);

        let json = serde_json::to_value(&served).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert_eq!(json["hint"], false);
        assert!(json.get("has_hint").is_none());

        let json = serde_json::to_value(QuizQuestion::from_question(
            question(3, 30, Some("Think transport")),
            &policy,
        ))
        .unwrap();
        assert_eq!(json["hint"], true);
    }

    #[test]
    fn random_pick_draws_from_candidates() {
        assert!(pick_random(Vec::new()).is_none());

        for _ in 0..20 {
            let picked = pick_random(vec![question(1, 30, None), question(2, 30, None)]).unwrap();
            assert!(picked.id == 1 || picked.id == 2);
        }
    }

    #[test]
    fn unanswered_questions_come_first() {
        let selection = choose_question(
            &XpPolicy::default(),
            vec![question(1, 30, None), question(2, 30, None)],
            vec![question(9, 30, None)],
            true,
            2,
        )
        .unwrap();

        assert!(selection.question.id == 1 || selection.question.id == 2);
        assert_eq!(selection.remaining, Some(2));
        assert_eq!(selection.all_answered, None);

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["remaining"], 2);
        assert!(json.get("all_answered").is_none());
    }

    #[test]
    fn repeats_flag_all_answered_for_returning_learners() {
        let selection = choose_question(
            &XpPolicy::default(),
            Vec::new(),
            vec![question(9, 30, None)],
            true,
            2,
        )
        .unwrap();

        assert_eq!(selection.question.id, 9);
        assert_eq!(selection.remaining, None);
        assert_eq!(selection.all_answered, Some(true));

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["all_answered"], true);
        assert!(json.get("remaining").is_none());
    }

    #[test]
    fn repeats_without_history_are_not_all_answered() {
        let selection = choose_question(
            &XpPolicy::default(),
            Vec::new(),
            vec![question(9, 30, None)],
            false,
            1,
        )
        .unwrap();

        assert_eq!(selection.all_answered, None);
        assert_eq!(selection.remaining, None);
    }

    #[test]
    fn empty_scope_names_the_level() {
        let result = choose_question(&XpPolicy::default(), Vec::new(), Vec::new(), true, 4);

        let Err(ApiError::NotFound(message)) = result else {
            panic!("expected not found");
        };
        assert_eq!(message, "No questions available for level 4");
    }
}
