use std::env;

use anyhow::Context as _;
use cyberquest_database::model::question::{Difficulty, QuestionType};
use cyberquest_utils::parse::{non_blank, parse_flag};
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
    models::ModelOptions,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{TOPICS, extract_json_block, question_prompt, system_prompt};

/// Question as proposed by the model. Every field is optional because the
/// model output is untrusted; the caller validates it like any other draft.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub hint: Option<String>,
}

const DEFAULT_HOST: &str = "http://127.0.0.1";
const DEFAULT_PORT: u16 = 11434;
const DEFAULT_MODEL: &str = "llama3.1:8b";

fn env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok();
    non_blank(value.as_deref()).map(str::to_owned)
}

#[derive(Clone, Debug)]
pub struct QuestionGenerator {
    client: Ollama,
    model: String,
}

impl QuestionGenerator {
    /// Generator configured from `OLLAMA_*`, or `None` when it is switched
    /// off or none of host, port and model is set.
    pub fn from_env_optional() -> anyhow::Result<Option<Self>> {
        let enabled = env_value("OLLAMA_ENABLED").is_none_or(|value| parse_flag(&value));
        let configured = ["OLLAMA_HOST", "OLLAMA_PORT", "OLLAMA_MODEL"]
            .into_iter()
            .any(|key| env_value(key).is_some());

        if !enabled || !configured {
            return Ok(None);
        }

        Ok(Some(Self::from_env()?))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_value("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match env_value("OLLAMA_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid OLLAMA_PORT `{raw}`"))?,
        };
        let model = env_value("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned());

        Ok(Self {
            client: Ollama::new(host, port),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for one question. A random topic is used when none is
    /// given and a random supported type when `question_type` is `None`.
    pub async fn generate_question(
        &self,
        topic: Option<&str>,
        question_type: Option<QuestionType>,
        difficulty: Difficulty,
    ) -> anyhow::Result<GeneratedQuestion> {
        let (topic, question_type) = resolve_request(topic, question_type);
        debug!(
            %topic,
            %question_type,
            %difficulty,
            model = %self.model,
            "requesting generated question"
        );

        let messages = vec![
            ChatMessage::system(system_prompt()),
            ChatMessage::user(question_prompt(&topic, question_type, difficulty)),
        ];

        let request = ChatMessageRequest::new(self.model.clone(), messages)
            .options(ModelOptions::default().temperature(0.7));
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .context("failed to get ollama chat response")?;

        parse_generated(&response.message.content)
    }
}

fn resolve_request(
    topic: Option<&str>,
    question_type: Option<QuestionType>,
) -> (String, QuestionType) {
    let mut rng = rand::thread_rng();

    let topic = topic
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_owned)
        .or_else(|| TOPICS.choose(&mut rng).map(|topic| (*topic).to_owned()))
        .unwrap_or_else(|| "network security".to_owned());

    let question_type = question_type
        .or_else(|| QuestionType::SUPPORTED.choose(&mut rng).copied())
        .unwrap_or(QuestionType::MultipleChoice);

    (topic, question_type)
}

/// Decode a model reply into a question proposal.
pub fn parse_generated(content: &str) -> anyhow::Result<GeneratedQuestion> {
    let payload = extract_json_block(content);
    serde_json::from_str(payload).context("model reply was not a JSON question object")
}
