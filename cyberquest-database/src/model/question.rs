use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question formats the quiz can serve. Older free-text formats may still
/// exist in the table but are never selected, graded or listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
}

impl QuestionType {
    pub const SUPPORTED: [QuestionType; 2] =
        [QuestionType::MultipleChoice, QuestionType::TrueFalse];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "true_false" => Some(QuestionType::TrueFalse),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very_hard",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "very_hard" => Some(Difficulty::VeryHard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub hint: Option<String>,
    pub level_required: i32,
    pub time_limit: i32,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Validated question ready to be inserted or to replace an existing row.
#[derive(Clone, Debug, PartialEq)]
pub struct NewQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub hint: Option<String>,
    pub level_required: i32,
    pub time_limit: i32,
}

/// Decode the stored option column.
///
/// Options are written as a JSON array. Anything that does not decode as one
/// is surfaced as a single option holding the raw text rather than dropped.
pub fn decode_options(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(options) => Some(options),
        Err(_) => Some(vec![raw.to_owned()]),
    }
}

pub fn encode_options(options: Option<&[String]>) -> anyhow::Result<Option<String>> {
    options
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| anyhow::anyhow!("failed to encode question options: {e}"))
}

#[cfg(test)]
mod tests {
    use super::{Difficulty, QuestionType, decode_options, encode_options};

    #[test]
    fn only_supported_types_parse() {
        assert_eq!(
            QuestionType::parse("multiple_choice"),
            Some(QuestionType::MultipleChoice)
        );
        assert_eq!(QuestionType::parse("TRUE_FALSE"), Some(QuestionType::TrueFalse));
        assert_eq!(QuestionType::parse("short_answer"), None);
        assert_eq!(QuestionType::parse("fill_blank"), None);
    }

    #[test]
    fn difficulty_includes_very_hard() {
        assert_eq!(Difficulty::parse("very_hard"), Some(Difficulty::VeryHard));
        assert_eq!(Difficulty::parse(" Medium"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("extreme"), None);
    }

    #[test]
    fn stored_options_keep_their_order() {
        let options = vec![
            "Phishing".to_owned(),
            "Tailgating".to_owned(),
            "Baiting, with a comma".to_owned(),
        ];
        let encoded = encode_options(Some(&options)).unwrap();
        assert_eq!(decode_options(encoded.as_deref()), Some(options));
    }

    #[test]
    fn undecodable_options_degrade_to_single_entry() {
        assert_eq!(
            decode_options(Some("A, B, C")),
            Some(vec!["A, B, C".to_owned()])
        );
        assert_eq!(decode_options(None), None);
        assert_eq!(decode_options(Some("")), None);
    }
}
