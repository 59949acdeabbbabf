use std::{fs, path::Path};

use cyberquest_database::model::question::{Difficulty, QuestionType};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a cybersecurity education expert. \
Generate practical, educational quiz questions and answer with a single JSON object only.";

/// Topics drawn from when the author does not name one.
pub const TOPICS: &[&str] = &[
    "phishing attacks",
    "malware and viruses",
    "social engineering",
    "password security",
    "network security",
    "encryption",
    "firewall configuration",
    "SQL injection",
    "XSS attacks",
    "DDoS attacks",
    "ransomware",
    "two-factor authentication",
    "VPN security",
    "email security",
    "browser security",
];

pub fn system_prompt() -> String {
    let prompt_file = Path::new("QUESTION_PROMPT.md");
    match fs::read_to_string(prompt_file) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => DEFAULT_SYSTEM_PROMPT.to_owned(),
    }
}

pub fn question_prompt(topic: &str, question_type: QuestionType, difficulty: Difficulty) -> String {
    let mut prompt = format!(
        "Generate a {} difficulty cybersecurity question about {}.\n\n\
         Question type: {}\n\n\
         Requirements:\n\
         - Make it educational and practical\n\
         - Focus on real-world scenarios when possible\n\
         - Ensure the question tests understanding, not just memorization\n\
         - Add a one-sentence hint that does not give the answer away\n\n",
        difficulty.as_str().replace('_', " "),
        topic,
        question_type.as_str(),
    );

    let format = match question_type {
        QuestionType::MultipleChoice => {
            "Format the response as JSON with:\n{\n  \"question_text\": \"The question text\",\n  \
             \"question_type\": \"multiple_choice\",\n  \
             \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],\n  \
             \"correct_answer\": \"Option A\",\n  \"category\": \"topic name\",\n  \
             \"difficulty\": \"easy/medium/hard\",\n  \"hint\": \"A short hint\"\n}"
        }
        QuestionType::TrueFalse => {
            "Format the response as JSON with:\n{\n  \
             \"question_text\": \"The statement to evaluate\",\n  \
             \"question_type\": \"true_false\",\n  \"options\": [\"True\", \"False\"],\n  \
             \"correct_answer\": \"True or False\",\n  \"category\": \"topic name\",\n  \
             \"difficulty\": \"easy/medium/hard\",\n  \"hint\": \"A short hint\"\n}"
        }
    };
    prompt.push_str(format);
    prompt
}

/// Pull the JSON payload out of a model reply that may wrap it in a fenced
/// code block.
pub fn extract_json_block(content: &str) -> &str {
    let trimmed = content.trim();

    let fenced = trimmed
        .split_once("```json")
        .or_else(|| trimmed.split_once("```"))
        .map(|(_, rest)| rest);

    match fenced {
        Some(rest) => rest.split("```").next().unwrap_or(rest).trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use cyberquest_database::model::question::{Difficulty, QuestionType};

    use super::{extract_json_block, question_prompt};

    #[test]
    fn plain_json_is_returned_as_is() {
        assert_eq!(extract_json_block("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let reply = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy!";
        assert_eq!(extract_json_block(reply), "{\"a\": 1}");

        let bare_fence = "```\n{\"b\": 2}\n```";
        assert_eq!(extract_json_block(bare_fence), "{\"b\": 2}");
    }

    #[test]
    fn prompt_names_type_and_difficulty() {
        let prompt = question_prompt("ransomware", QuestionType::TrueFalse, Difficulty::VeryHard);
        assert!(prompt.contains("very hard difficulty cybersecurity question about ransomware"));
        assert!(prompt.contains("\"question_type\": \"true_false\""));
    }
}
