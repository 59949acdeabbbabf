use cyberquest_database::{
    Database, impls::questions::create_question, model::question::NewQuestion,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    authoring::QuestionDraft,
    error::{ApiError, ApiResult},
};

pub const REQUIRED_HEADERS: [&str; 5] = [
    "question_text",
    "question_type",
    "correct_answer",
    "category",
    "difficulty",
];

/// One data row that passed validation, with its 1-based file row number.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRow {
    pub row: usize,
    pub question: NewQuestion,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedCsv {
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportReport {
    pub message: String,
    pub created: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

struct Columns {
    question_text: usize,
    question_type: usize,
    correct_answer: usize,
    category: usize,
    difficulty: usize,
    options: Option<usize>,
    hint: Option<usize>,
    level_required: Option<usize>,
    time_limit: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> ApiResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        let missing: Vec<&str> = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|name| find(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "CSV is missing required columns: {}",
                missing.join(", ")
            )));
        }

        let required = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            question_text: required("question_text"),
            question_type: required("question_type"),
            correct_answer: required("correct_answer"),
            category: required("category"),
            difficulty: required("difficulty"),
            options: find("options"),
            hint: find("hint"),
            level_required: find("level_required"),
            time_limit: find("time_limit"),
        })
    }

    fn draft(&self, record: &csv::StringRecord) -> Result<QuestionDraft, String> {
        let cell = |index: usize| record.get(index).map(str::to_owned);
        let optional = |index: Option<usize>| {
            index
                .and_then(|index| record.get(index))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let time_limit = match optional(self.time_limit) {
            None => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| format!("time_limit `{raw}` is not a number"))?,
            ),
        };

        Ok(QuestionDraft {
            question_text: cell(self.question_text),
            question_type: cell(self.question_type),
            options: optional(self.options)
                .map_or(Value::Null, |raw| Value::String(raw.to_owned())),
            correct_answer: cell(self.correct_answer).map_or(Value::Null, Value::String),
            category: cell(self.category),
            difficulty: cell(self.difficulty),
            hint: optional(self.hint).map(str::to_owned),
            level_required: optional(self.level_required)
                .map_or(Value::Null, |raw| Value::String(raw.to_owned())),
            time_limit,
        })
    }
}

/// Parse an uploaded CSV. A bad header fails the whole file; bad rows are
/// collected as `Row N: reason`, counting the header as row 1.
pub fn parse_questions_csv(bytes: &[u8]) -> ApiResult<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|err| ApiError::BadRequest(format!("Could not read CSV header: {err}")))?
        .clone();
    let columns = Columns::from_headers(&headers)?;

    let mut parsed = ParsedCsv::default();
    for (index, record) in reader.records().enumerate() {
        let row = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                parsed.errors.push(format!("Row {row}: {err}"));
                continue;
            }
        };

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let question = columns.draft(&record).and_then(|draft| {
            draft.validate().map_err(|fields| {
                fields
                    .into_iter()
                    .map(|field| field.message)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        });

        match question {
            Ok(question) => parsed.rows.push(ParsedRow { row, question }),
            Err(reason) => parsed.errors.push(format!("Row {row}: {reason}")),
        }
    }

    Ok(parsed)
}

/// Store every valid row. Rows that fail to insert are reported like
/// validation failures and do not stop the rest.
pub async fn import_questions(
    db: &Database,
    author_id: i64,
    bytes: &[u8],
) -> ApiResult<ImportReport> {
    let ParsedCsv { rows, mut errors } = parse_questions_csv(bytes)?;

    let mut created = 0;
    for ParsedRow { row, question } in rows {
        match create_question(db, &question, Some(author_id)).await {
            Ok(_) => created += 1,
            Err(err) => {
                warn!(?err, row, "failed to store imported question");
                errors.push(format!("Row {row}: could not be saved"));
            }
        }
    }

    info!(author_id, created, failed = errors.len(), "imported questions from csv");

    Ok(ImportReport {
        message: format!("Imported {created} questions"),
        created,
        errors,
    })
}
