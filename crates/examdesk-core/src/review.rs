//! Read-only review of a completed attempt.

use std::fmt;

use crate::error::ApiError;
use crate::model::{AttemptDetail, Exam, ExamAttempt, Id, Question};
use crate::presentation::Bucket;
use crate::traits::LearnerBackend;

pub const ATTEMPT_NOT_FOUND: &str = "Exam attempt not found";
pub const ACCESS_DENIED: &str = "Access denied";
pub const REVIEW_FAILED: &str = "Failed to load exam review";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    NotAnswered,
}

impl AnswerStatus {
    pub fn icon(&self) -> char {
        match self {
            AnswerStatus::Correct => '✓',
            AnswerStatus::Incorrect => '✗',
            AnswerStatus::NotAnswered => '○',
        }
    }
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnswerStatus::Correct => "Correct",
            AnswerStatus::Incorrect => "Incorrect",
            AnswerStatus::NotAnswered => "Not Answered",
        };
        f.write_str(s)
    }
}

/// Compare the learner's answer with the stored correct answer.
///
/// The comparison is an exact string match; surrounding whitespace is
/// significant. An answer against a question with no correct answer on
/// record counts as incorrect.
pub fn answer_status(question: &Question) -> AnswerStatus {
    let answer = match question.user_answer.as_deref() {
        Some(a) if !a.is_empty() => a,
        _ => return AnswerStatus::NotAnswered,
    };
    match question.correct_answer.as_deref() {
        Some(correct) if correct == answer => AnswerStatus::Correct,
        _ => AnswerStatus::Incorrect,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    /// 1-based position in the exam.
    pub number: usize,
    pub question: Question,
    pub status: AnswerStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExamReview {
    pub attempt: ExamAttempt,
    pub exam: Exam,
    pub items: Vec<ReviewItem>,
}

/// Load failure, carrying the message to show in place of the review.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ReviewError {
    pub message: &'static str,
    pub source: ApiError,
}

impl From<ApiError> for ReviewError {
    fn from(source: ApiError) -> Self {
        let message = match source.status() {
            Some(404) => ATTEMPT_NOT_FOUND,
            Some(403) => ACCESS_DENIED,
            _ => REVIEW_FAILED,
        };
        Self { message, source }
    }
}

impl ExamReview {
    pub async fn load<B: LearnerBackend + ?Sized>(
        backend: &B,
        attempt_id: Id,
    ) -> Result<Self, ReviewError> {
        let detail = backend.attempt_detail(attempt_id).await.map_err(|e| {
            tracing::warn!(attempt_id, "failed to fetch exam review: {e}");
            ReviewError::from(e)
        })?;
        Ok(Self::from_detail(detail))
    }

    pub fn from_detail(detail: AttemptDetail) -> Self {
        let items = detail
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, question)| ReviewItem {
                number: i + 1,
                status: answer_status(&question),
                question,
            })
            .collect();
        Self {
            attempt: detail.attempt,
            exam: detail.exam,
            items,
        }
    }

    pub fn summary(&self) -> ReviewSummary {
        self.items
            .iter()
            .fold(ReviewSummary::default(), |mut acc, item| {
                match item.status {
                    AnswerStatus::Correct => acc.correct += 1,
                    AnswerStatus::Incorrect => acc.incorrect += 1,
                    AnswerStatus::NotAnswered => acc.unanswered += 1,
                }
                acc
            })
    }

    pub fn percentage(&self) -> f64 {
        self.attempt.computed_percentage()
    }

    pub fn bucket(&self) -> Bucket {
        Bucket::from_percentage(self.percentage())
    }
}
