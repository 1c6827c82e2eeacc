//! Purpose: Typed worksheet/question model decoded from the QA export JSON.
//! Exports: `Worksheet`, `WorksheetId`, `Question`, `AnswerOption`, `load_worksheet`.
//! Role: Load-time validation so consumers never see half-shaped question data.
//! Invariants: Question ids are unique; option keys are unique per question.
//! Invariants: `correctAnswer` always names one of the question's options.
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::json::parse;

#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WorksheetId {
    Number(u64),
    Text(String),
}

impl fmt::Display for WorksheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorksheetId::Number(id) => write!(f, "{id}"),
            WorksheetId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerOption {
    pub key: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub question: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer: String,
    pub correct_answer_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn option(&self, key: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.key == key)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Worksheet {
    pub id: WorksheetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Deserialize)]
struct Envelope {
    worksheet: Worksheet,
}

impl Worksheet {
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let value: Value = parse::from_str(input).map_err(|err| {
            Error::new(ErrorKind::SourceParse)
                .with_message("worksheet is not valid JSON")
                .with_hint(parse::hint_for_error(&err, "worksheet"))
                .with_source(err)
        })?;
        Self::from_value(value)
    }

    /// Decodes the `{"worksheet": {...}}` envelope and validates it.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_value(value).map_err(|err| {
            Error::new(ErrorKind::Schema)
                .with_message(format!("invalid worksheet shape: {err}"))
                .with_hint("Expected {\"worksheet\": {\"id\", \"questions\": [...]}}.")
        })?;
        let worksheet = envelope.worksheet;
        worksheet.validate()?;
        Ok(worksheet)
    }

    pub fn question(&self, id: u64) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id) {
                return Err(schema_error(question.id, "duplicate question id"));
            }
            if question.options.is_empty() {
                return Err(schema_error(question.id, "question has no options"));
            }
            let mut keys = HashSet::new();
            for option in &question.options {
                if !keys.insert(option.key.as_str()) {
                    return Err(schema_error(
                        question.id,
                        &format!("duplicate option key `{}`", option.key),
                    ));
                }
            }
            if question.option(&question.correct_answer).is_none() {
                return Err(schema_error(
                    question.id,
                    &format!(
                        "correctAnswer `{}` is not one of the options",
                        question.correct_answer
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn schema_error(question_id: u64, message: &str) -> Error {
    Error::new(ErrorKind::Schema).with_message(format!("question {question_id}: {message}"))
}

pub fn load_worksheet(path: &Path) -> Result<Worksheet, Error> {
    let text = fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::SourceRead)
            .with_message("failed to read worksheet")
            .with_path(path)
            .with_source(err)
    })?;
    Worksheet::from_json_str(&text).map_err(|err| err.with_path(path))
}
