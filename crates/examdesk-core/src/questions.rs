//! Bulk question entry: pasted JSON to validated drafts.
//!
//! Parsing is split from submission so that a JSON syntax error is reported
//! as [`BulkAddError::MalformedJson`], never confused with a server rejection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;
use crate::lettering::{is_valid_letter, letter_index, option_letter, valid_letters};
use crate::model::{Id, QuestionType};

/// A question as entered by an admin, before the server assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question_text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_marks")]
    pub marks: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_path: Option<String>,
}

fn default_subject() -> String {
    "General".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_marks() -> u32 {
    1
}

/// Body of `POST /questions`.
#[derive(Debug, Clone, Serialize)]
pub struct AddQuestionsRequest<'a> {
    pub exam_id: Id,
    pub questions: &'a [QuestionDraft],
}

/// Why a bulk add did not go through.
#[derive(Debug, Clone, Error)]
pub enum BulkAddError {
    #[error("Please enter questions data")]
    Empty,

    /// The pasted text is not JSON at all.
    #[error("Invalid JSON format. Please check your input. ({0})")]
    MalformedJson(String),

    /// Valid JSON, but not a question object or array of them.
    #[error("questions must be a JSON object or array of objects: {0}")]
    InvalidShape(String),

    /// One draft breaks a question invariant. `index` is 0-based.
    #[error("question {}: {reason}", .index + 1)]
    InvalidQuestion { index: usize, reason: String },

    /// The server refused the submission.
    #[error("Add failed: {}", .0.display_message("Unknown error"))]
    Rejected(ApiError),
}

impl BulkAddError {
    pub fn is_malformed_json(&self) -> bool {
        matches!(self, BulkAddError::MalformedJson(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, BulkAddError::Rejected(_))
    }
}

impl QuestionDraft {
    /// Rewrite a multiple-choice answer given as option text into its letter.
    pub fn normalize(&mut self) {
        if self.question_type != QuestionType::MultipleChoice {
            return;
        }
        let Some(answer) = self.correct_answer.as_deref() else {
            return;
        };
        if letter_index(answer).is_some() {
            return;
        }
        if let Some(letter) = self
            .options
            .iter()
            .position(|o| o == answer)
            .and_then(option_letter)
        {
            self.correct_answer = Some(letter.to_string());
        }
    }

    /// Check the invariants the server relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("question_text is required".into());
        }
        if self.marks == 0 {
            return Err("marks must be a positive integer".into());
        }
        if self.question_type == QuestionType::MultipleChoice {
            if self.options.len() < 2 {
                return Err("multiple_choice questions need at least two options".into());
            }
            if self.options.len() > 26 {
                return Err("multiple_choice questions support at most 26 options".into());
            }
            match self.correct_answer.as_deref() {
                Some(answer) if is_valid_letter(answer, self.options.len()) => {}
                Some(answer) => {
                    return Err(format!(
                        "correct_answer '{answer}' must be one of {}",
                        valid_letters(self.options.len()).join(", ")
                    ))
                }
                None => return Err("correct_answer is required".into()),
            }
        }
        Ok(())
    }
}

/// Parse pasted text into validated drafts.
///
/// A single JSON object is accepted as a one-element list.
pub fn parse_bulk_questions(text: &str) -> Result<Vec<QuestionDraft>, BulkAddError> {
    if text.trim().is_empty() {
        return Err(BulkAddError::Empty);
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| BulkAddError::MalformedJson(e.to_string()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            return Err(BulkAddError::InvalidShape(format!(
                "found {}",
                json_kind(&other)
            )))
        }
    };

    let mut drafts = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let mut draft: QuestionDraft = serde_json::from_value(item)
            .map_err(|e| BulkAddError::InvalidShape(format!("question {}: {e}", index + 1)))?;
        draft.normalize();
        draft
            .validate()
            .map_err(|reason| BulkAddError::InvalidQuestion { index, reason })?;
        drafts.push(draft);
    }

    if drafts.is_empty() {
        return Err(BulkAddError::Empty);
    }
    Ok(drafts)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
