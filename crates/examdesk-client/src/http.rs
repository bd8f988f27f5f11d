//! HTTP implementation of the backend traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use examdesk_core::error::ADMIN_REQUIRED;
use examdesk_core::forms::{LoginForm, RegisterForm};
use examdesk_core::model::{
    Answers, AttemptDetail, Exam, ExamAttempt, ExamForm, ExamUpdate, GradeResult, Id, Question,
    QuestionUpdate, User,
};
use examdesk_core::questions::{AddQuestionsRequest, QuestionDraft};
use examdesk_core::traits::{AdminBackend, AuthBackend, AuthResponse, LearnerBackend};
use examdesk_core::{ApiError, Session};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Paths whose 401 means "bad credentials" rather than "session expired".
const PUBLIC_PATHS: [&str; 2] = ["/login", "/register"];

/// Client for the exam platform REST API.
///
/// The bearer token is read from the injected [`Session`] on every request,
/// so logging in through one handle is visible to all clones.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    session: Session,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Session,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            timeout,
            session,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("content-type", "application/json");
        if let Some(token) = self.session.token() {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    /// Send `req` and decode a successful body as `T`.
    async fn fetch<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(path, req).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(path, "unexpected response body: {e}");
            ApiError::Decode(e.to_string())
        })
    }

    /// Send `req`, classify the status, and return the raw body.
    async fn send(&self, path: &str, req: RequestBuilder) -> Result<String, ApiError> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout.as_secs())
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(path, status, "response received");

        if status < 400 {
            return Ok(body);
        }
        let err = classify_status(status, path, &body);
        if err.is_unauthenticated() {
            tracing::warn!(path, "session rejected by server, clearing local session");
            self.session.clear();
        }
        Err(err)
    }
}

/// Map an error status to an [`ApiError`], pulling the server's message from
/// an `{error}` or `{message}` body when present.
pub fn classify_status(status: u16, path: &str, body: &str) -> ApiError {
    let message = error_message(body);
    match status {
        401 if !is_public(path) => ApiError::Unauthenticated,
        403 => ApiError::Forbidden {
            message: message.unwrap_or_else(|| ADMIN_REQUIRED.to_string()),
        },
        404 => ApiError::NotFound {
            message: message.unwrap_or_else(|| "Not found".to_string()),
        },
        _ => ApiError::Server { status, message },
    }
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ExamsEnvelope {
    #[serde(default)]
    exams: Vec<Exam>,
}

#[derive(Deserialize)]
struct ExamEnvelope {
    exam: Exam,
}

#[derive(Deserialize)]
struct QuestionsEnvelope {
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Deserialize)]
struct QuestionEnvelope {
    question: Question,
}

#[derive(Deserialize)]
struct AttemptsEnvelope {
    #[serde(default)]
    exam_attempts: Vec<ExamAttempt>,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    answers: &'a Answers,
}

#[async_trait]
impl AuthBackend for ApiClient {
    #[instrument(skip(self, form), fields(user = %form.username_or_email))]
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
        let path = "/login";
        self.fetch(path, self.request(Method::POST, path).json(form))
            .await
    }

    #[instrument(skip(self, form), fields(user = %form.username))]
    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ApiError> {
        let path = "/register";
        self.fetch(path, self.request(Method::POST, path).json(&form.to_request()))
            .await
    }

    #[instrument(skip(self))]
    async fn profile(&self) -> Result<User, ApiError> {
        let path = "/profile";
        let env: UserEnvelope = self.fetch(path, self.request(Method::GET, path)).await?;
        Ok(env.user)
    }
}

#[async_trait]
impl LearnerBackend for ApiClient {
    #[instrument(skip(self))]
    async fn available_exams(&self) -> Result<Vec<Exam>, ApiError> {
        let path = "/exams?status=active&include_attempts=true";
        let env: ExamsEnvelope = self.fetch(path, self.request(Method::GET, path)).await?;
        Ok(env.exams)
    }

    #[instrument(skip(self))]
    async fn exam(&self, exam_id: Id) -> Result<Exam, ApiError> {
        let path = format!("/exams/{exam_id}");
        let env: ExamEnvelope = self.fetch(&path, self.request(Method::GET, &path)).await?;
        Ok(env.exam)
    }

    #[instrument(skip(self))]
    async fn exam_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError> {
        let path = format!("/exams/{exam_id}/questions");
        let env: QuestionsEnvelope = self.fetch(&path, self.request(Method::GET, &path)).await?;
        Ok(env.questions)
    }

    #[instrument(skip(self))]
    async fn attempts(&self) -> Result<Vec<ExamAttempt>, ApiError> {
        let path = "/exam-attempts";
        let env: AttemptsEnvelope = self.fetch(path, self.request(Method::GET, path)).await?;
        Ok(env.exam_attempts)
    }

    #[instrument(skip(self))]
    async fn attempt_detail(&self, attempt_id: Id) -> Result<AttemptDetail, ApiError> {
        let path = format!("/exam-attempts/{attempt_id}");
        self.fetch(&path, self.request(Method::GET, &path)).await
    }

    #[instrument(skip(self, answers), fields(answered = answers.len()))]
    async fn submit_graded_exam(
        &self,
        exam_id: Id,
        answers: &Answers,
    ) -> Result<GradeResult, ApiError> {
        let path = format!("/submit-graded-exam/{exam_id}");
        let body = SubmitBody { answers };
        self.fetch(&path, self.request(Method::POST, &path).json(&body))
            .await
    }
}

#[async_trait]
impl AdminBackend for ApiClient {
    #[instrument(skip(self))]
    async fn list_exams(&self) -> Result<Vec<Exam>, ApiError> {
        let path = "/exams";
        let env: ExamsEnvelope = self.fetch(path, self.request(Method::GET, path)).await?;
        Ok(env.exams)
    }

    async fn get_exam(&self, exam_id: Id) -> Result<Exam, ApiError> {
        LearnerBackend::exam(self, exam_id).await
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    async fn create_exam(&self, form: &ExamForm) -> Result<Exam, ApiError> {
        let path = "/exams";
        let env: ExamEnvelope = self
            .fetch(path, self.request(Method::POST, path).json(form))
            .await?;
        Ok(env.exam)
    }

    #[instrument(skip(self, update))]
    async fn update_exam(&self, exam_id: Id, update: &ExamUpdate) -> Result<Exam, ApiError> {
        let path = format!("/exams/{exam_id}");
        let env: ExamEnvelope = self
            .fetch(&path, self.request(Method::PATCH, &path).json(update))
            .await?;
        Ok(env.exam)
    }

    #[instrument(skip(self))]
    async fn delete_exam(&self, exam_id: Id) -> Result<(), ApiError> {
        let path = format!("/exams/{exam_id}");
        self.send(&path, self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError> {
        let path = format!("/questions?exam_id={exam_id}");
        let env: QuestionsEnvelope = self.fetch(&path, self.request(Method::GET, &path)).await?;
        Ok(env.questions)
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    async fn add_questions(
        &self,
        exam_id: Id,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, ApiError> {
        let path = "/questions";
        let body = AddQuestionsRequest {
            exam_id,
            questions: drafts,
        };
        let env: QuestionsEnvelope = self
            .fetch(path, self.request(Method::POST, path).json(&body))
            .await?;
        Ok(env.questions)
    }

    #[instrument(skip(self, update))]
    async fn update_question(
        &self,
        question_id: Id,
        update: &QuestionUpdate,
    ) -> Result<Question, ApiError> {
        let path = format!("/questions/{question_id}");
        let env: QuestionEnvelope = self
            .fetch(&path, self.request(Method::PATCH, &path).json(update))
            .await?;
        Ok(env.question)
    }

    #[instrument(skip(self))]
    async fn delete_question(&self, question_id: Id) -> Result<(), ApiError> {
        let path = format!("/questions/{question_id}");
        self.send(&path, self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}
