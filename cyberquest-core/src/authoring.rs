use cyberquest_database::{
    Database,
    impls::questions::create_question,
    model::question::{Difficulty, NewQuestion, Question, QuestionType},
};
use cyberquest_llm::{GeneratedQuestion, QuestionGenerator};
use cyberquest_utils::parse::{answers_match, coerce_level, non_blank, split_option_list};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, FieldError};

pub const DEFAULT_TIME_LIMIT_SECS: i32 = 30;

/// Question as submitted by an author. Loose on input shape: options may be a
/// list or a comma-joined string and numbers may arrive as strings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuestionDraft {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub correct_answer: Value,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub hint: Option<String>,
    #[serde(default)]
    pub level_required: Value,
    pub time_limit: Option<i64>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn option_list(value: &Value) -> Option<Vec<String>> {
    let options: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .map(|option| option.trim().to_owned())
            .filter(|option| !option.is_empty())
            .collect(),
        Value::String(joined) => split_option_list(joined),
        _ => return None,
    };

    (!options.is_empty()).then_some(options)
}

fn level_value(value: &Value) -> i32 {
    scalar_text(value).map_or(1, |raw| coerce_level(&raw))
}

impl QuestionDraft {
    pub fn validate(&self) -> Result<NewQuestion, Vec<FieldError>> {
        let mut errors = Vec::new();

        let question_text = non_blank(self.question_text.as_deref());
        if question_text.is_none() {
            errors.push(FieldError::new("question_text", "question_text is required"));
        }

        let question_type = match non_blank(self.question_type.as_deref()) {
            None => {
                errors.push(FieldError::new("question_type", "question_type is required"));
                None
            }
            Some(raw) => {
                let parsed = QuestionType::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new(
                        "question_type",
                        format!(
                            "Unsupported question type `{raw}`; \
                             use multiple_choice or true_false"
                        ),
                    ));
                }
                parsed
            }
        };

        let difficulty = match non_blank(self.difficulty.as_deref()) {
            None => Some(Difficulty::Medium),
            Some(raw) => {
                let parsed = Difficulty::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new(
                        "difficulty",
                        "difficulty must be one of easy, medium, hard, very_hard",
                    ));
                }
                parsed
            }
        };

        let category = non_blank(self.category.as_deref());
        if category.is_none() {
            errors.push(FieldError::new("category", "category is required"));
        }

        let correct_answer = scalar_text(&self.correct_answer)
            .map(|answer| answer.trim().to_owned())
            .filter(|answer| !answer.is_empty());
        if correct_answer.is_none() {
            errors.push(FieldError::new("correct_answer", "correct_answer is required"));
        }

        let mut options = option_list(&self.options);
        match (question_type, correct_answer.as_deref()) {
            (Some(QuestionType::MultipleChoice), answer) => match options.as_deref() {
                Some(list) if list.len() >= 2 => {
                    let listed = answer.is_none_or(|answer| {
                        list.iter().any(|option| answers_match(option, answer))
                    });
                    if !listed {
                        errors.push(FieldError::new(
                            "correct_answer",
                            "correct_answer must be one of the options",
                        ));
                    }
                }
                _ => errors.push(FieldError::new(
                    "options",
                    "multiple_choice questions need at least two options",
                )),
            },
            (Some(QuestionType::TrueFalse), answer) => {
                if options.is_none() {
                    options = Some(vec!["True".to_owned(), "False".to_owned()]);
                }
                let boolean = answer.is_none_or(|answer| {
                    answers_match("true", answer) || answers_match("false", answer)
                });
                if !boolean {
                    errors.push(FieldError::new(
                        "correct_answer",
                        "true_false questions must be answered True or False",
                    ));
                }
            }
            (None, _) => {}
        }

        let time_limit = match self.time_limit {
            None => DEFAULT_TIME_LIMIT_SECS,
            Some(secs) if secs > 0 => i32::try_from(secs).unwrap_or(i32::MAX),
            Some(_) => {
                errors.push(FieldError::new("time_limit", "time_limit must be positive"));
                DEFAULT_TIME_LIMIT_SECS
            }
        };

        match (question_text, question_type, difficulty, category, correct_answer) {
            (
                Some(question_text),
                Some(question_type),
                Some(difficulty),
                Some(category),
                Some(correct_answer),
            ) if errors.is_empty() => Ok(NewQuestion {
                question_text: question_text.to_owned(),
                question_type,
                options,
                correct_answer,
                category: category.to_owned(),
                difficulty,
                hint: non_blank(self.hint.as_deref()).map(str::to_owned),
                level_required: level_value(&self.level_required),
                time_limit,
            }),
            _ => Err(errors),
        }
    }
}

impl From<GeneratedQuestion> for QuestionDraft {
    fn from(generated: GeneratedQuestion) -> Self {
        Self {
            question_text: generated.question_text,
            question_type: generated.question_type,
            options: generated
                .options
                .map(|options| Value::Array(options.into_iter().map(Value::String).collect()))
                .unwrap_or(Value::Null),
            correct_answer: generated.correct_answer.map_or(Value::Null, Value::String),
            category: generated.category,
            difficulty: generated.difficulty,
            hint: generated.hint,
            level_required: Value::Null,
            time_limit: None,
        }
    }
}

/// Body of `POST /api/questions/generate`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateBody {
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub question_type: Option<String>,
    #[serde(default)]
    pub level_required: Value,
}

pub async fn create_from_draft(
    db: &Database,
    author_id: i64,
    draft: &QuestionDraft,
) -> ApiResult<Question> {
    let question = draft.validate().map_err(ApiError::Validation)?;
    let created = create_question(db, &question, Some(author_id)).await?;
    info!(question_id = created.id, author_id, "created question");
    Ok(created)
}

/// Ask the generator for a question and store it like an authored draft.
/// Unsupported requested types are generated as multiple choice.
pub async fn generate_and_store(
    db: &Database,
    generator: Option<&QuestionGenerator>,
    author_id: i64,
    body: &GenerateBody,
) -> ApiResult<Question> {
    let generator = generator.ok_or_else(|| {
        ApiError::Unavailable("Question generation is not configured".to_owned())
    })?;

    let difficulty = match non_blank(body.difficulty.as_deref()) {
        None => Difficulty::Medium,
        Some(raw) => Difficulty::parse(raw).ok_or_else(|| {
            ApiError::field(
                "difficulty",
                "difficulty must be one of easy, medium, hard, very_hard",
            )
        })?,
    };
    let question_type = non_blank(body.question_type.as_deref())
        .map(|raw| QuestionType::parse(raw).unwrap_or(QuestionType::MultipleChoice));

    let generated = generator
        .generate_question(body.topic.as_deref(), question_type, difficulty)
        .await
        .map_err(|err| {
            warn!(?err, model = generator.model(), "question generation failed");
            ApiError::BadGateway("Question generator did not return a usable question".to_owned())
        })?;

    let mut draft = QuestionDraft::from(generated);
    if non_blank(draft.difficulty.as_deref()).is_none() {
        draft.difficulty = Some(difficulty.as_str().to_owned());
    }
    let type_missing = non_blank(draft.question_type.as_deref()).is_none();
    if let (true, Some(question_type)) = (type_missing, question_type) {
        draft.question_type = Some(question_type.as_str().to_owned());
    }
    draft.level_required = body.level_required.clone();

    let question = draft.validate().map_err(|fields| {
        warn!(?fields, "generated question failed validation");
        ApiError::BadGateway("Question generator did not return a usable question".to_owned())
    })?;

    let created = create_question(db, &question, Some(author_id)).await?;
    info!(question_id = created.id, author_id, "stored generated question");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use cyberquest_database::model::question::{Difficulty, QuestionType};
    use cyberquest_llm::GeneratedQuestion;
    use serde_json::json;

    use super::QuestionDraft;

    fn draft(value: serde_json::Value) -> QuestionDraft {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn multiple_choice_draft_keeps_option_order() {
        let question = draft(json!({
            "question_text": "Which attack floods a target with traffic?",
            "question_type": "multiple_choice",
            "options": ["Phishing", "DDoS", "SQL injection"],
            "correct_answer": "ddos",
            "category": "attacks",
            "difficulty": "easy",
            "level_required": "2",
        }))
        .validate()
        .unwrap();

        assert_eq!(question.question_type, QuestionType::MultipleChoice);
        assert_eq!(
            question.options,
            Some(vec!["Phishing".to_owned(), "DDoS".to_owned(), "SQL injection".to_owned()])
        );
        assert_eq!(question.difficulty, Difficulty::Easy);
        assert_eq!(question.level_required, 2);
        assert_eq!(question.time_limit, 30);
    }

    #[test]
    fn joined_options_are_split() {
        let question = draft(json!({
            "question_text": "Pick the hashing algorithm",
            "question_type": "multiple_choice",
            "options": "AES, SHA-256 ,RSA",
            "correct_answer": "SHA-256",
            "category": "crypto",
        }))
        .validate()
        .unwrap();

        assert_eq!(question.options.unwrap(), vec!["AES", "SHA-256", "RSA"]);
        assert_eq!(question.difficulty, Difficulty::Medium);
    }

    #[test]
    fn true_false_defaults_options() {
        let question = draft(json!({
            "question_text": "HTTPS encrypts traffic",
            "question_type": "true_false",
            "correct_answer": true,
            "category": "web",
            "level_required": 2.7,
        }))
        .validate()
        .unwrap();

        assert_eq!(question.options.unwrap(), vec!["True", "False"]);
        assert_eq!(question.correct_answer, "true");
        assert_eq!(question.level_required, 2);
    }

    #[test]
    fn invalid_drafts_list_their_fields() {
        let errors = draft(json!({
            "question_type": "short_answer",
            "difficulty": "extreme",
            "time_limit": 0,
        }))
        .validate()
        .unwrap_err();

        let fields: Vec<_> = errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "question_text",
                "question_type",
                "difficulty",
                "category",
                "correct_answer",
                "time_limit",
            ]
        );
    }

    #[test]
    fn multiple_choice_answer_must_be_listed() {
        let errors = draft(json!({
            "question_text": "Which port is SSH?",
            "question_type": "multiple_choice",
            "options": ["21", "23"],
            "correct_answer": "22",
            "category": "networking",
        }))
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "correct_answer");
    }

    #[test]
    fn generated_question_becomes_draft() {
        let generated = GeneratedQuestion {
            question_text: Some("What does MFA add?".to_owned()),
            question_type: Some("multiple_choice".to_owned()),
            options: Some(vec!["A second factor".to_owned(), "Longer passwords".to_owned()]),
            correct_answer: Some("A second factor".to_owned()),
            category: Some("authentication".to_owned()),
            difficulty: Some("easy".to_owned()),
            hint: Some("Think factors".to_owned()),
        };

        let question = QuestionDraft::from(generated).validate().unwrap();
        assert_eq!(question.hint.as_deref(), Some("Think factors"));
        assert_eq!(question.level_required, 1);
    }

    #[test]
    fn listed_answer_check_matches_grading() {
        let question = draft(json!({
            "question_text": "Welches Wort bedeutet Ärger?",
            "question_type": "multiple_choice",
            "options": ["Ärger", "Freude"],
            "correct_answer": "ärger",
            "category": "awareness",
        }))
        .validate()
        .unwrap();

        assert_eq!(question.correct_answer, "ärger");
        assert!(crate::progression::submission::is_correct_answer(
            &question.correct_answer,
            "Ärger"
        ));
    }
}
