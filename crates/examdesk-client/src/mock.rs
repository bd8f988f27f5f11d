//! In-memory backend for exercising the view models without a server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use examdesk_core::error::ADMIN_REQUIRED;
use examdesk_core::forms::{LoginForm, RegisterForm};
use examdesk_core::model::{
    Answers, AttemptDetail, AttemptStatus, Exam, ExamAttempt, ExamForm, ExamUpdate, GradeResult,
    Id, Question, QuestionUpdate, User,
};
use examdesk_core::questions::QuestionDraft;
use examdesk_core::traits::{AdminBackend, AuthBackend, AuthResponse, LearnerBackend};
use examdesk_core::ApiError;

#[derive(Default)]
struct MockState {
    next_id: Id,
    users: Vec<(User, String)>,
    current_user: Option<Id>,
    exams: Vec<Exam>,
    questions: Vec<Question>,
    attempts: Vec<ExamAttempt>,
    /// Answers submitted per attempt id.
    answers: HashMap<Id, Answers>,
}

impl MockState {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn current(&self) -> Result<&User, ApiError> {
        let id = self.current_user.ok_or(ApiError::Unauthenticated)?;
        self.users
            .iter()
            .map(|(u, _)| u)
            .find(|u| u.id == id)
            .ok_or(ApiError::Unauthenticated)
    }

    fn admin(&self) -> Result<&User, ApiError> {
        let user = self.current()?;
        if user.is_admin {
            Ok(user)
        } else {
            Err(ApiError::Forbidden {
                message: ADMIN_REQUIRED.to_string(),
            })
        }
    }

    fn exam(&self, exam_id: Id) -> Result<&Exam, ApiError> {
        self.exams
            .iter()
            .find(|e| e.id == exam_id)
            .ok_or_else(|| not_found("Exam not found"))
    }

    fn exam_mut(&mut self, exam_id: Id) -> Result<&mut Exam, ApiError> {
        self.exams
            .iter_mut()
            .find(|e| e.id == exam_id)
            .ok_or_else(|| not_found("Exam not found"))
    }

    fn questions_for(&self, exam_id: Id) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.exam_id == Some(exam_id))
            .cloned()
            .collect()
    }

    /// Keep `question_count` and `total_marks` in step with the questions.
    fn recount(&mut self, exam_id: Id) {
        let (count, marks) = self
            .questions
            .iter()
            .filter(|q| q.exam_id == Some(exam_id))
            .fold((0, 0), |(c, m), q| (c + 1, m + q.marks));
        if let Ok(exam) = self.exam_mut(exam_id) {
            exam.question_count = count;
            exam.total_marks = marks;
            exam.updated_at = Some(Utc::now());
        }
    }

    fn user_attempts(&self, user_id: Id) -> Vec<ExamAttempt> {
        let mut attempts: Vec<ExamAttempt> = self
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        attempts
    }
}

fn not_found(message: &str) -> ApiError {
    ApiError::NotFound {
        message: message.to_string(),
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::Server {
        status: 400,
        message: Some(message.to_string()),
    }
}

/// Questions as a learner sees them before submitting: no answer key.
fn redact(mut question: Question) -> Question {
    question.correct_answer = None;
    question
}

fn is_correct(question: &Question, answer: &str) -> bool {
    question
        .correct_answer
        .as_deref()
        .is_some_and(|correct| correct.trim().eq_ignore_ascii_case(answer.trim()))
}

/// A stateful in-memory exam platform.
///
/// Implements every backend trait. The caller signs in with
/// [`AuthBackend::login`] (or [`MockBackend::sign_in`]); admin endpoints
/// answer 403 for non-admins and everything but login/register answers 401
/// when nobody is signed in.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    call_count: AtomicU32,
    fail_next: Mutex<Option<ApiError>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the call and return any injected failure.
    fn enter(&self) -> Result<MutexGuard<'_, MockState>, ApiError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let injected = self
            .fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match injected {
            Some(err) => Err(err),
            None => Ok(self.state()),
        }
    }

    /// Number of backend calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Make the next backend call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(err);
    }

    pub fn add_user(&self, username: &str, password: &str, is_admin: bool) -> User {
        let mut state = self.state();
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            is_admin,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.push((user.clone(), password.to_string()));
        user
    }

    pub fn sign_in(&self, user_id: Id) {
        self.state().current_user = Some(user_id);
    }

    pub fn sign_out(&self) {
        self.state().current_user = None;
    }

    pub fn add_exam(&self, title: &str, is_active: bool) -> Exam {
        let mut state = self.state();
        let exam = Exam {
            id: state.next_id(),
            title: title.to_string(),
            description: None,
            is_active,
            question_count: 0,
            total_marks: 0,
            created_at: Utc::now(),
            updated_at: None,
            has_attempted: false,
            latest_attempt: None,
        };
        state.exams.push(exam.clone());
        exam
    }

    /// Add a multiple-choice question whose answer key is `correct`.
    pub fn add_choice_question(
        &self,
        exam_id: Id,
        text: &str,
        options: &[&str],
        correct: &str,
    ) -> Question {
        let mut state = self.state();
        let question = Question {
            id: state.next_id(),
            exam_id: Some(exam_id),
            question_text: text.to_string(),
            question_type: Default::default(),
            subject: "General".to_string(),
            difficulty: "medium".to_string(),
            marks: 1,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: Some(correct.to_string()),
            question_context: None,
            diagram_path: None,
            user_answer: None,
        };
        state.questions.push(question.clone());
        state.recount(exam_id);
        question
    }

    /// Snapshot of an exam as stored, regardless of the caller's role.
    pub fn stored_exam(&self, exam_id: Id) -> Option<Exam> {
        self.state().exam(exam_id).ok().cloned()
    }

    fn issue(state: &mut MockState, user: User) -> AuthResponse {
        state.current_user = Some(user.id);
        AuthResponse {
            access_token: format!("mock-token-{}", user.id),
            user,
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
        let mut state = self.enter()?;
        let who = form.username_or_email.trim();
        let user = state
            .users
            .iter()
            .find(|(u, pw)| (u.username == who || u.email == who) && *pw == form.password)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| ApiError::Server {
                status: 401,
                message: Some("Invalid credentials".to_string()),
            })?;
        Ok(Self::issue(&mut state, user))
    }

    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ApiError> {
        let mut state = self.enter()?;
        if state.users.iter().any(|(u, _)| u.username == form.username) {
            return Err(ApiError::Server {
                status: 409,
                message: Some("Username already exists".to_string()),
            });
        }
        if state.users.iter().any(|(u, _)| u.email == form.email) {
            return Err(ApiError::Server {
                status: 409,
                message: Some("Email already exists".to_string()),
            });
        }
        let user = User {
            id: state.next_id(),
            username: form.username.clone(),
            email: form.email.clone(),
            is_admin: false,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.push((user.clone(), form.password.clone()));
        Ok(Self::issue(&mut state, user))
    }

    async fn profile(&self) -> Result<User, ApiError> {
        let state = self.enter()?;
        state.current().cloned()
    }
}

#[async_trait]
impl LearnerBackend for MockBackend {
    async fn available_exams(&self) -> Result<Vec<Exam>, ApiError> {
        let state = self.enter()?;
        let user_id = state.current()?.id;
        let attempts = state.user_attempts(user_id);
        Ok(state
            .exams
            .iter()
            .filter(|e| e.is_active)
            .map(|e| {
                let latest = attempts.iter().find(|a| a.exam_id == e.id).cloned();
                Exam {
                    has_attempted: latest.is_some(),
                    latest_attempt: latest,
                    ..e.clone()
                }
            })
            .collect())
    }

    async fn exam(&self, exam_id: Id) -> Result<Exam, ApiError> {
        let state = self.enter()?;
        state.current()?;
        state.exam(exam_id).cloned()
    }

    async fn exam_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError> {
        let state = self.enter()?;
        state.current()?;
        state.exam(exam_id)?;
        Ok(state
            .questions_for(exam_id)
            .into_iter()
            .map(redact)
            .collect())
    }

    async fn attempts(&self) -> Result<Vec<ExamAttempt>, ApiError> {
        let state = self.enter()?;
        let user_id = state.current()?.id;
        Ok(state.user_attempts(user_id))
    }

    async fn attempt_detail(&self, attempt_id: Id) -> Result<AttemptDetail, ApiError> {
        let state = self.enter()?;
        let user = state.current()?;
        let attempt = state
            .attempts
            .iter()
            .find(|a| a.id == attempt_id)
            .cloned()
            .ok_or_else(|| not_found("Exam attempt not found"))?;
        if attempt.user_id != user.id && !user.is_admin {
            return Err(ApiError::Forbidden {
                message: "Access denied".to_string(),
            });
        }
        let exam = state.exam(attempt.exam_id)?.clone();
        let answers = state.answers.get(&attempt_id);
        let questions = state
            .questions_for(attempt.exam_id)
            .into_iter()
            .map(|mut q| {
                q.user_answer = answers.and_then(|a| a.get(q.id)).map(str::to_string);
                q
            })
            .collect();
        Ok(AttemptDetail {
            attempt,
            exam,
            questions,
        })
    }

    async fn submit_graded_exam(
        &self,
        exam_id: Id,
        answers: &Answers,
    ) -> Result<GradeResult, ApiError> {
        let mut state = self.enter()?;
        let user_id = state.current()?.id;
        let exam = state.exam(exam_id)?.clone();
        if !exam.is_active {
            return Err(bad_request("Exam is not active"));
        }
        if answers.is_empty() {
            return Err(bad_request("No answers provided"));
        }

        let questions = state.questions_for(exam_id);
        let score: u32 = questions
            .iter()
            .filter(|q| answers.get(q.id).is_some_and(|a| is_correct(q, a)))
            .map(|q| q.marks)
            .sum();
        let total_marks: u32 = questions.iter().map(|q| q.marks).sum();

        let now = Utc::now();
        let attempt = ExamAttempt {
            id: state.next_id(),
            user_id,
            exam_id,
            exam_title: Some(exam.title.clone()),
            score,
            total_marks,
            score_percentage: examdesk_core::model::percentage(score, total_marks),
            total_questions: Some(questions.len() as u32),
            duration_minutes: Some(0.0),
            status: AttemptStatus::Completed,
            started_at: now,
            completed_at: Some(now),
        };
        let result = GradeResult {
            score,
            total_marks,
            score_percentage: attempt.score_percentage,
            total_questions: attempt.total_questions,
            attempt_id: Some(attempt.id),
            message: Some("Exam graded successfully".to_string()),
        };
        state.answers.insert(attempt.id, answers.clone());
        state.attempts.push(attempt);
        Ok(result)
    }
}

#[async_trait]
impl AdminBackend for MockBackend {
    async fn list_exams(&self) -> Result<Vec<Exam>, ApiError> {
        let state = self.enter()?;
        state.admin()?;
        Ok(state.exams.clone())
    }

    async fn get_exam(&self, exam_id: Id) -> Result<Exam, ApiError> {
        let state = self.enter()?;
        state.admin()?;
        state.exam(exam_id).cloned()
    }

    async fn create_exam(&self, form: &ExamForm) -> Result<Exam, ApiError> {
        let mut state = self.enter()?;
        state.admin()?;
        if form.title.trim().is_empty() {
            return Err(bad_request("Title is required"));
        }
        let description = Some(form.description.clone()).filter(|d| !d.is_empty());
        let exam = Exam {
            id: state.next_id(),
            title: form.title.clone(),
            description,
            is_active: true,
            question_count: 0,
            total_marks: 0,
            created_at: Utc::now(),
            updated_at: None,
            has_attempted: false,
            latest_attempt: None,
        };
        state.exams.push(exam.clone());
        Ok(exam)
    }

    async fn update_exam(&self, exam_id: Id, update: &ExamUpdate) -> Result<Exam, ApiError> {
        let mut state = self.enter()?;
        state.admin()?;
        let exam = state.exam_mut(exam_id)?;
        if let Some(active) = update.is_active {
            exam.is_active = active;
        }
        if let Some(title) = &update.title {
            exam.title = title.clone();
        }
        if let Some(description) = &update.description {
            exam.description = Some(description.clone());
        }
        exam.updated_at = Some(Utc::now());
        Ok(exam.clone())
    }

    async fn delete_exam(&self, exam_id: Id) -> Result<(), ApiError> {
        let mut state = self.enter()?;
        state.admin()?;
        state.exam(exam_id)?;
        state.exams.retain(|e| e.id != exam_id);
        state.questions.retain(|q| q.exam_id != Some(exam_id));
        Ok(())
    }

    async fn list_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError> {
        let state = self.enter()?;
        state.admin()?;
        state.exam(exam_id)?;
        Ok(state.questions_for(exam_id))
    }

    async fn add_questions(
        &self,
        exam_id: Id,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, ApiError> {
        let mut state = self.enter()?;
        state.admin()?;
        state.exam(exam_id)?;
        if drafts.is_empty() {
            return Err(bad_request("No questions provided"));
        }

        let mut added = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let question = Question {
                id: state.next_id(),
                exam_id: Some(exam_id),
                question_text: draft.question_text.clone(),
                question_type: draft.question_type.clone(),
                subject: draft.subject.clone(),
                difficulty: draft.difficulty.clone(),
                marks: draft.marks,
                options: draft.options.clone(),
                correct_answer: draft.correct_answer.clone(),
                question_context: draft.question_context.clone(),
                diagram_path: draft.diagram_path.clone(),
                user_answer: None,
            };
            state.questions.push(question.clone());
            added.push(question);
        }
        state.recount(exam_id);
        Ok(added)
    }

    async fn update_question(
        &self,
        question_id: Id,
        update: &QuestionUpdate,
    ) -> Result<Question, ApiError> {
        let mut state = self.enter()?;
        state.admin()?;
        if update.is_empty() {
            return Err(bad_request("No valid fields provided"));
        }
        let question = state
            .questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| not_found("Question not found"))?;

        if let Some(v) = &update.question_text {
            question.question_text = v.clone();
        }
        if let Some(v) = &update.question_type {
            question.question_type = v.clone();
        }
        if let Some(v) = &update.subject {
            question.subject = v.clone();
        }
        if let Some(v) = &update.difficulty {
            question.difficulty = v.clone();
        }
        if let Some(v) = update.marks {
            question.marks = v;
        }
        if let Some(v) = &update.options {
            question.options = v.clone();
        }
        if let Some(v) = &update.correct_answer {
            question.correct_answer = Some(v.clone());
        }
        if let Some(v) = &update.question_context {
            question.question_context = Some(v.clone());
        }
        if let Some(v) = &update.diagram_path {
            question.diagram_path = Some(v.clone());
        }

        let updated = question.clone();
        if let Some(exam_id) = updated.exam_id {
            state.recount(exam_id);
        }
        Ok(updated)
    }

    async fn delete_question(&self, question_id: Id) -> Result<(), ApiError> {
        let mut state = self.enter()?;
        state.admin()?;
        let exam_id = state
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| not_found("Question not found"))?
            .exam_id;
        state.questions.retain(|q| q.id != question_id);
        if let Some(exam_id) = exam_id {
            state.recount(exam_id);
        }
        Ok(())
    }
}
