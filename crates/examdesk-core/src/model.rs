//! Wire data model for the exam platform.
//!
//! These types mirror the JSON the REST API exchanges. Field defaults follow
//! what the server omits or nulls in practice.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier type shared by every entity.
pub type Id = u64;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A named collection of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub question_count: u32,
    #[serde(default)]
    pub total_marks: u32,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Only present when listed with `include_attempts=true`.
    #[serde(default)]
    pub has_attempted: bool,
    /// Only present when listed with `include_attempts=true`.
    #[serde(default)]
    pub latest_attempt: Option<ExamAttempt>,
}

/// Body of `POST /exams`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update sent with `PATCH /exams/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExamUpdate {
    pub fn set_active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Kind of question. Unknown server values are preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    FillBlank,
    ShortAnswer,
    Other(String),
}

impl From<String> for QuestionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "multiple_choice" => QuestionType::MultipleChoice,
            "fill_blank" => QuestionType::FillBlank,
            "short_answer" => QuestionType::ShortAnswer,
            _ => QuestionType::Other(s),
        }
    }
}

impl From<QuestionType> for String {
    fn from(t: QuestionType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::FillBlank => write!(f, "fill_blank"),
            QuestionType::ShortAnswer => write!(f, "short_answer"),
            QuestionType::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A single question belonging to an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    /// Older servers still call this `test_id`.
    #[serde(default, alias = "test_id")]
    pub exam_id: Option<Id>,
    pub question_text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_difficulty", deserialize_with = "difficulty_or_default")]
    pub difficulty: String,
    #[serde(default = "default_marks", deserialize_with = "marks_or_default")]
    pub marks: u32,
    #[serde(default, deserialize_with = "options_or_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub question_context: Option<String>,
    #[serde(default)]
    pub diagram_path: Option<String>,
    /// Filled in by the server on attempt-review payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
}

impl Question {
    pub fn is_multiple_choice(&self) -> bool {
        self.question_type == QuestionType::MultipleChoice
    }
}

/// Partial update sent with `PATCH /questions/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram_path: Option<String>,
}

impl QuestionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == QuestionUpdate::default()
    }
}

/// Lifecycle of an attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttemptStatus {
    #[default]
    InProgress,
    Completed,
    Abandoned,
    Other(String),
}

impl From<String> for AttemptStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "in_progress" => AttemptStatus::InProgress,
            "completed" => AttemptStatus::Completed,
            "abandoned" => AttemptStatus::Abandoned,
            _ => AttemptStatus::Other(s),
        }
    }
}

impl From<AttemptStatus> for String {
    fn from(s: AttemptStatus) -> Self {
        s.to_string()
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::InProgress => write!(f, "in_progress"),
            AttemptStatus::Completed => write!(f, "completed"),
            AttemptStatus::Abandoned => write!(f, "abandoned"),
            AttemptStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

impl AttemptStatus {
    /// Human label, e.g. "IN PROGRESS".
    pub fn label(&self) -> String {
        self.to_string().replace('_', " ").to_uppercase()
    }
}

/// One learner's run through an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamAttempt {
    pub id: Id,
    pub user_id: Id,
    pub exam_id: Id,
    #[serde(default)]
    pub exam_title: Option<String>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub total_marks: u32,
    #[serde(default)]
    pub score_percentage: f64,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub status: AttemptStatus,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExamAttempt {
    /// `score / total_marks * 100`, rounded to one decimal; 0 when the exam
    /// carries no marks.
    pub fn computed_percentage(&self) -> f64 {
        percentage(self.score, self.total_marks)
    }

    /// Completed attempts are review-only.
    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }
}

/// `score / total * 100` rounded to one decimal place.
pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(score) / f64::from(total) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Submitted answers keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, String>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer for a question.
    pub fn insert(&mut self, question_id: Id, answer: impl Into<String>) {
        self.0.insert(question_id.to_string(), answer.into());
    }

    pub fn get(&self, question_id: Id) -> Option<&str> {
        self.0.get(&question_id.to_string()).map(String::as_str)
    }

    pub fn remove(&mut self, question_id: Id) -> Option<String> {
        self.0.remove(&question_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Authoritative result returned by `POST /submit-graded-exam/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub score: u32,
    pub total_marks: u32,
    pub score_percentage: f64,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub attempt_id: Option<Id>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `GET /exam-attempts/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    pub attempt: ExamAttempt,
    pub exam: Exam,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_true() -> bool {
    true
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

fn difficulty_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_difficulty))
}

fn marks_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(default_marks))
}

fn options_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps as the server writes them.
///
/// Accepts RFC 3339 and the naive ISO 8601 form (no offset), which is read
/// as UTC. Always serializes as RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }
    }
}
