//! End-to-end view model flows against the in-memory backend and a mocked
//! HTTP server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use examdesk_client::{ApiClient, FileSessionStore, MockBackend};
use examdesk_core::admin::{AdminConsole, ConsoleError, QuestionManager};
use examdesk_core::auth::AuthFlow;
use examdesk_core::cancel::{CancelScope, CancelToken};
use examdesk_core::dashboard::LearnerDashboard;
use examdesk_core::forms::LoginForm;
use examdesk_core::grading::{FlowError, GradingFlow};
use examdesk_core::model::{Exam, ExamForm, ExamUpdate, Id, Question, QuestionUpdate};
use examdesk_core::presentation::Bucket;
use examdesk_core::questions::{BulkAddError, QuestionDraft};
use examdesk_core::review::{AnswerStatus, ExamReview};
use examdesk_core::routes::{self, Route, RouteDecision};
use examdesk_core::traits::AdminBackend;
use examdesk_core::view_state::ToastKind;
use examdesk_core::{ApiError, Session};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_form(user: &str, password: &str) -> LoginForm {
    LoginForm {
        username_or_email: user.into(),
        password: password.into(),
    }
}

fn admin_backend() -> MockBackend {
    let backend = MockBackend::new();
    let admin = backend.add_user("root", "adminpass", true);
    backend.sign_in(admin.id);
    backend
}

// --- Auth and routing ---

#[tokio::test]
async fn login_then_dashboard_over_http() {
    let server = MockServer::start().await;
    let user = json!({
        "id": 7,
        "username": "alice",
        "email": "alice@example.com",
        "is_admin": false,
        "created_at": "2025-03-01T09:00:00"
    });
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt-7", "user": user})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/exams"))
        .and(header("Authorization", "Bearer jwt-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exams": [{
            "id": 1,
            "title": "Algebra",
            "is_active": true,
            "question_count": 10,
            "total_marks": 10,
            "created_at": "2025-03-01T09:00:00"
        }]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/exam-attempts"))
        .and(header("Authorization", "Bearer jwt-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exam_attempts": [{
            "id": 3,
            "user_id": 7,
            "exam_id": 1,
            "exam_title": "Algebra",
            "score": 7,
            "total_marks": 10,
            "score_percentage": 70.0,
            "status": "completed",
            "started_at": "2025-03-02T10:00:00"
        }]})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(Arc::new(FileSessionStore::new(dir.path().join("s.json"))));
    let api = ApiClient::new(server.uri(), Duration::from_secs(5), session.clone()).unwrap();

    assert_eq!(routes::settle(Route::Dashboard, &session), Route::Login);

    let (user, route) = AuthFlow::new(&api, session.clone())
        .login(&login_form("alice", "secret123"))
        .await
        .unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(route, Route::Dashboard);
    assert_eq!(
        routes::resolve(Route::Login, &session),
        RouteDecision::Redirect(Route::Dashboard)
    );

    let dash = LearnerDashboard::load(&api, &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(dash.available.len(), 1);
    assert_eq!(dash.available[0].last_attempt.as_ref().map(|a| a.id), Some(3));
    assert_eq!(dash.history[0].bucket, Bucket::Good);

    assert_eq!(routes::logout(&session), Route::Login);
    assert_eq!(
        routes::resolve(Route::Dashboard, &session),
        RouteDecision::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn cancelled_dashboard_load_is_discarded() {
    let backend = MockBackend::new();
    let user = backend.add_user("alice", "secret123", false);
    backend.sign_in(user.id);

    let scope = CancelScope::new();
    let token = scope.token();
    drop(scope);
    let err = LearnerDashboard::load(&backend, &token).await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

// --- Admin ---

#[tokio::test]
async fn toggle_active_is_reflected_after_refetch() {
    let backend = admin_backend();
    let exam = backend.add_exam("Chemistry", true);

    let mut console = AdminConsole::new(&backend);
    console.refresh().await.unwrap();
    assert!(console.exam(exam.id).unwrap().is_active);

    console.toggle_status(exam.id).await.unwrap();
    assert!(!console.exam(exam.id).unwrap().is_active);
    assert_eq!(
        console.toast().message(),
        Some("Exam status updated successfully!")
    );

    console.toggle_status(exam.id).await.unwrap();
    assert!(backend.stored_exam(exam.id).unwrap().is_active);
}

#[tokio::test]
async fn create_and_delete_exam_with_confirmation() {
    let backend = admin_backend();
    let mut console = AdminConsole::new(&backend);

    let blank = ExamForm {
        title: "   ".into(),
        description: String::new(),
    };
    let calls = backend.call_count();
    assert!(matches!(
        console.create_exam(&blank).await,
        Err(ConsoleError::Validation(_))
    ));
    assert_eq!(backend.call_count(), calls);
    assert_eq!(console.toast().message(), Some("Please enter a exam title"));

    let form = ExamForm {
        title: "  Biology ".into(),
        description: "Cells".into(),
    };
    let created = console.create_exam(&form).await.unwrap();
    assert_eq!(created.title, "Biology");
    assert_eq!(console.exams().len(), 1);

    console.request_delete(created.id).unwrap();
    assert_eq!(console.delete_modal().label(), Some("Biology"));
    console.cancel_delete();
    assert!(matches!(
        console.confirm_delete().await,
        Err(ConsoleError::NothingPending)
    ));
    assert_eq!(console.exams().len(), 1);

    console.request_delete(created.id).unwrap();
    console.confirm_delete().await.unwrap();
    assert!(console.exams().is_empty());
    assert_eq!(console.toast().message(), Some("Exam deleted successfully!"));
}

#[tokio::test]
async fn non_admin_is_sent_away() {
    let backend = MockBackend::new();
    let user = backend.add_user("alice", "secret123", false);
    backend.sign_in(user.id);

    let mut console = AdminConsole::new(&backend);
    let err = console.refresh().await.unwrap_err();
    assert!(matches!(err, ConsoleError::AdminRequired));
    assert_eq!(err.to_string(), "Admin access required");
}

#[tokio::test]
async fn bulk_add_distinguishes_bad_json_from_rejection() {
    let backend = admin_backend();
    let exam = backend.add_exam("Geography", true);
    let mut manager = QuestionManager::new(&backend, exam.id);
    manager.refresh().await.unwrap();

    let calls = backend.call_count();
    let err = manager.bulk_add("{bad json").await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::BulkAdd(BulkAddError::MalformedJson(_))
    ));
    assert_eq!(backend.call_count(), calls);
    assert_eq!(
        manager.toast().message(),
        Some("Invalid JSON format. Please check your input.")
    );

    backend.fail_next(ApiError::Server {
        status: 400,
        message: Some("Duplicate question".into()),
    });
    let err = manager
        .bulk_add(r#"[{"question_text": "Capital of France?", "options": ["Paris", "Rome"], "correct_answer": "A"}]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::BulkAdd(BulkAddError::Rejected(_))));
    assert_eq!(manager.toast().kind(), Some(ToastKind::Error));
    assert!(manager.questions().is_empty());

    let added = manager
        .bulk_add(r#"{"question_text": "Capital of France?", "options": ["Paris", "Rome"], "correct_answer": "Paris"}"#)
        .await
        .unwrap();
    assert_eq!(added[0].correct_answer.as_deref(), Some("A"));
    assert_eq!(manager.questions().len(), 1);
    assert_eq!(manager.exam().unwrap().question_count, 1);
    assert_eq!(
        manager.toast().message(),
        Some("Successfully added 1 question(s)")
    );

    let qid = added[0].id;
    manager.request_delete(qid).unwrap();
    manager.confirm_delete().await.unwrap();
    assert!(manager.questions().is_empty());
}

/// Accepts writes, then fails every list/read that follows one.
struct ListingBreaksAfterWrite {
    inner: MockBackend,
    broken: AtomicBool,
}

impl ListingBreaksAfterWrite {
    fn new(inner: MockBackend) -> Self {
        Self {
            inner,
            broken: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(ApiError::Network("connection reset".into()))
        } else {
            Ok(())
        }
    }

    fn wrote<T>(&self, res: Result<T, ApiError>) -> Result<T, ApiError> {
        if res.is_ok() {
            self.broken.store(true, Ordering::SeqCst);
        }
        res
    }
}

#[async_trait]
impl AdminBackend for ListingBreaksAfterWrite {
    async fn list_exams(&self) -> Result<Vec<Exam>, ApiError> {
        self.check()?;
        self.inner.list_exams().await
    }
    async fn get_exam(&self, exam_id: Id) -> Result<Exam, ApiError> {
        self.check()?;
        AdminBackend::get_exam(&self.inner, exam_id).await
    }
    async fn create_exam(&self, form: &ExamForm) -> Result<Exam, ApiError> {
        self.wrote(self.inner.create_exam(form).await)
    }
    async fn update_exam(&self, exam_id: Id, update: &ExamUpdate) -> Result<Exam, ApiError> {
        self.wrote(self.inner.update_exam(exam_id, update).await)
    }
    async fn delete_exam(&self, exam_id: Id) -> Result<(), ApiError> {
        self.wrote(self.inner.delete_exam(exam_id).await)
    }
    async fn list_questions(&self, exam_id: Id) -> Result<Vec<Question>, ApiError> {
        self.check()?;
        self.inner.list_questions(exam_id).await
    }
    async fn add_questions(
        &self,
        exam_id: Id,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, ApiError> {
        self.wrote(self.inner.add_questions(exam_id, drafts).await)
    }
    async fn update_question(
        &self,
        question_id: Id,
        update: &QuestionUpdate,
    ) -> Result<Question, ApiError> {
        self.wrote(self.inner.update_question(question_id, update).await)
    }
    async fn delete_question(&self, question_id: Id) -> Result<(), ApiError> {
        self.wrote(self.inner.delete_question(question_id).await)
    }
}

#[tokio::test]
async fn create_survives_failed_refetch() {
    let backend = ListingBreaksAfterWrite::new(admin_backend());
    let mut console = AdminConsole::new(&backend);
    console.refresh().await.unwrap();
    assert!(!console.is_stale());

    let form = ExamForm {
        title: "Astronomy".into(),
        description: String::new(),
    };
    let created = console.create_exam(&form).await.unwrap();
    assert_eq!(console.toast().kind(), Some(ToastKind::Success));
    assert_eq!(console.toast().message(), Some("Exam created successfully!"));
    assert!(console.is_stale());
    assert!(console.exams().is_empty());
    assert!(backend.inner.stored_exam(created.id).is_some());

    backend.broken.store(false, Ordering::SeqCst);
    console.refresh().await.unwrap();
    assert!(!console.is_stale());
    assert_eq!(console.exams().len(), 1);
}

#[tokio::test]
async fn question_delete_survives_failed_refetch() {
    let inner = admin_backend();
    let exam = inner.add_exam("Music", true);
    let q = inner.add_choice_question(exam.id, "Notes in an octave?", &["7", "12"], "B");
    let backend = ListingBreaksAfterWrite::new(inner);

    let mut manager = QuestionManager::new(&backend, exam.id);
    manager.refresh().await.unwrap();
    manager.request_delete(q.id).unwrap();
    assert_eq!(manager.confirm_delete().await.unwrap(), q.id);
    assert_eq!(manager.toast().message(), Some("Question deleted successfully"));
    assert!(manager.is_stale());
}

#[tokio::test]
async fn question_update_refetches_and_rejects_empty_update() {
    let backend = admin_backend();
    let exam = backend.add_exam("Physics", true);
    let q = backend.add_choice_question(exam.id, "Unit of force?", &["Newton", "Joule"], "A");

    let mut manager = QuestionManager::new(&backend, exam.id);
    manager.refresh().await.unwrap();

    let calls = backend.call_count();
    let err = manager
        .update_question(q.id, &QuestionUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(ref m) if m == "No valid fields provided"));
    assert_eq!(backend.call_count(), calls);

    let update = QuestionUpdate {
        marks: Some(4),
        difficulty: Some("hard".into()),
        ..Default::default()
    };
    let updated = manager.update_question(q.id, &update).await.unwrap();
    assert_eq!(updated.marks, 4);
    assert_eq!(manager.toast().message(), Some("Question updated successfully"));
    assert!(!manager.is_stale());

    let listed = &manager.questions()[0];
    assert_eq!(listed.marks, 4);
    assert_eq!(listed.difficulty, "hard");
    assert_eq!(listed.question_text, "Unit of force?");
    assert_eq!(manager.exam().unwrap().total_marks, 4);
}

// --- Learner ---

#[tokio::test]
async fn grade_then_review() {
    let backend = MockBackend::new();
    let exam = backend.add_exam("Capitals", true);
    let q1 = backend.add_choice_question(exam.id, "France?", &["Paris", "Rome"], "A");
    let q2 = backend.add_choice_question(exam.id, "Italy?", &["Paris", "Rome"], "B");
    let q3 = backend.add_choice_question(exam.id, "Spain?", &["Madrid", "Lisbon"], "A");

    let session = Session::in_memory();
    backend.add_user("alice", "secret123", false);
    AuthFlow::new(&backend, session.clone())
        .login(&login_form("alice", "secret123"))
        .await
        .unwrap();

    let mut flow = GradingFlow::new(&backend);
    flow.load_exams().await.unwrap();
    flow.select_exam(exam.id).await.unwrap();
    assert!(matches!(flow.submit().await, Err(FlowError::NothingAnswered)));

    flow.record_answer(q1.id, "A").unwrap();
    flow.record_answer(q2.id, "A").unwrap();
    let result = flow.submit().await.unwrap();
    assert_eq!((result.score, result.total_marks), (1, 3));
    assert_eq!(result.score_percentage, 33.3);
    flow.reset();

    let review = ExamReview::load(&backend, result.attempt_id.unwrap())
        .await
        .unwrap();
    let statuses: Vec<AnswerStatus> = review.items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![
            AnswerStatus::Correct,
            AnswerStatus::Incorrect,
            AnswerStatus::NotAnswered
        ]
    );
    assert_eq!(review.items[2].question.id, q3.id);
    assert_eq!(review.bucket(), Bucket::Poor);

    let dash = LearnerDashboard::load(&backend, &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(dash.history.len(), 1);
    assert!(dash.available[0].last_attempt.is_some());
}

#[tokio::test]
async fn review_of_someone_elses_attempt_is_denied() {
    let backend = MockBackend::new();
    let exam = backend.add_exam("Capitals", true);
    let q = backend.add_choice_question(exam.id, "France?", &["Paris", "Rome"], "A");
    let alice = backend.add_user("alice", "secret123", false);
    let bob = backend.add_user("bob", "secret456", false);

    backend.sign_in(alice.id);
    let mut flow = GradingFlow::new(&backend);
    flow.select_exam(exam.id).await.unwrap();
    flow.record_answer(q.id, "A").unwrap();
    let attempt_id = flow.submit().await.unwrap().attempt_id.unwrap();

    backend.sign_in(bob.id);
    let err = ExamReview::load(&backend, attempt_id).await.unwrap_err();
    assert_eq!(err.to_string(), "Access denied");
    let err = ExamReview::load(&backend, 9999).await.unwrap_err();
    assert_eq!(err.to_string(), "Exam attempt not found");
}
