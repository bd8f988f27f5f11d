//! Backend trait definitions.
//!
//! The view models talk to the platform only through these traits.
//! `examdesk-client` implements them over HTTP and provides an in-memory
//! mock for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::forms::{LoginForm, RegisterForm};
use crate::model::{
    Answers, AttemptDetail, Exam, ExamAttempt, ExamForm, ExamUpdate, GradeResult, Id, Question,
    QuestionUpdate, User,
};
use crate::questions::QuestionDraft;

/// Response of `POST /login` and `POST /register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError>;

    /// `form` has already passed client-side validation.
    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ApiError>;

    async fn profile(&self) -> Result<User, ApiError>;
}

// ---------------------------------------------------------------------------
// Learner
// ---------------------------------------------------------------------------

#[async_trait]
pub trait LearnerBackend: Send + Sync {
    /// Active exams, each with the caller's attempt summary.
    async fn available_exams(&self) -> Result<Vec<Exam>, ApiError>;

    async fn exam(&self, exam_id: Id) -> Result<Exam, ApiError>;

    async fn exam_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError>;

    /// The caller's attempts, in server order.
    async fn attempts(&self) -> Result<Vec<ExamAttempt>, ApiError>;

    async fn attempt_detail(&self, attempt_id: Id) -> Result<AttemptDetail, ApiError>;

    async fn submit_graded_exam(
        &self,
        exam_id: Id,
        answers: &Answers,
    ) -> Result<GradeResult, ApiError>;
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn list_exams(&self) -> Result<Vec<Exam>, ApiError>;

    async fn get_exam(&self, exam_id: Id) -> Result<Exam, ApiError>;

    async fn create_exam(&self, form: &ExamForm) -> Result<Exam, ApiError>;

    /// Returns the server's post-update exam.
    async fn update_exam(&self, exam_id: Id, update: &ExamUpdate) -> Result<Exam, ApiError>;

    async fn delete_exam(&self, exam_id: Id) -> Result<(), ApiError>;

    async fn list_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError>;

    async fn add_questions(
        &self,
        exam_id: Id,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, ApiError>;

    async fn update_question(
        &self,
        question_id: Id,
        update: &QuestionUpdate,
    ) -> Result<Question, ApiError>;

    async fn delete_question(&self, question_id: Id) -> Result<(), ApiError>;
}
