//! Admin view models: exam management and per-exam question management.
//!
//! Every successful mutation is followed by a full re-fetch; local lists are
//! never patched optimistically. A failed re-fetch does not turn an accepted
//! mutation into an error: the view is marked stale instead.

use thiserror::Error;

use crate::error::ApiError;
use crate::model::{Exam, ExamForm, ExamUpdate, Id, Question, QuestionUpdate};
use crate::questions::{parse_bulk_questions, BulkAddError};
use crate::traits::AdminBackend;
use crate::view_state::{ConfirmModal, SubmitGate, Toast};

/// Failures surfaced by the admin screens.
#[derive(Debug, Clone, Error)]
pub enum ConsoleError {
    /// 403: the caller should leave the admin area with this notice.
    #[error("Admin access required")]
    AdminRequired,

    #[error("{0}")]
    Validation(String),

    /// A delete was confirmed with nothing pending.
    #[error("nothing to confirm")]
    NothingPending,

    #[error("exam {id} not found in the current list")]
    UnknownExam { id: Id },

    #[error("a request is already in progress")]
    Busy,

    #[error(transparent)]
    BulkAdd(#[from] BulkAddError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn classify(err: ApiError) -> ConsoleError {
    if err.is_forbidden() {
        ConsoleError::AdminRequired
    } else {
        ConsoleError::Api(err)
    }
}

/// The admin dashboard: list, create, delete and (de)activate exams.
pub struct AdminConsole<'a, B: AdminBackend + ?Sized> {
    backend: &'a B,
    exams: Vec<Exam>,
    toast: Toast,
    delete_modal: ConfirmModal<Id>,
    creating: SubmitGate,
    stale: bool,
}

impl<'a, B: AdminBackend + ?Sized> AdminConsole<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            exams: Vec::new(),
            toast: Toast::default(),
            delete_modal: ConfirmModal::default(),
            creating: SubmitGate::new(),
            stale: false,
        }
    }

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn exam(&self, exam_id: Id) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == exam_id)
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    pub fn delete_modal(&self) -> &ConfirmModal<Id> {
        &self.delete_modal
    }

    /// True when the last re-fetch after a mutation failed, so `exams()`
    /// may not reflect the server.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub async fn refresh(&mut self) -> Result<(), ConsoleError> {
        match self.backend.list_exams().await {
            Ok(exams) => {
                tracing::debug!(count = exams.len(), "loaded exams");
                self.exams = exams;
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("failed to fetch exams: {e}");
                Err(classify(e))
            }
        }
    }

    async fn refetch_after_change(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!("change saved but exam list re-fetch failed: {e}");
            self.stale = true;
        }
    }

    pub async fn create_exam(&mut self, form: &ExamForm) -> Result<Exam, ConsoleError> {
        let title = form.title.trim();
        if title.is_empty() {
            let msg = "Please enter a exam title";
            self.toast.error(msg);
            return Err(ConsoleError::Validation(msg.into()));
        }
        let _ticket = self.creating.try_begin().ok_or(ConsoleError::Busy)?;

        let form = ExamForm {
            title: title.to_string(),
            description: form.description.trim().to_string(),
        };
        match self.backend.create_exam(&form).await {
            Ok(exam) => {
                tracing::info!(exam_id = exam.id, title = %exam.title, "exam created");
                self.refetch_after_change().await;
                self.toast.success("Exam created successfully!");
                Ok(exam)
            }
            Err(e) => {
                self.toast
                    .error(format!("Create failed: {}", e.display_message("Unknown error")));
                Err(classify(e))
            }
        }
    }

    /// Open the delete confirmation for an exam in the current list.
    pub fn request_delete(&mut self, exam_id: Id) -> Result<(), ConsoleError> {
        let title = self
            .exam(exam_id)
            .map(|e| e.title.clone())
            .ok_or(ConsoleError::UnknownExam { id: exam_id })?;
        self.delete_modal.request(exam_id, title);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.delete_modal.cancel();
    }

    pub async fn confirm_delete(&mut self) -> Result<Id, ConsoleError> {
        let exam_id = self
            .delete_modal
            .confirm()
            .ok_or(ConsoleError::NothingPending)?;
        match self.backend.delete_exam(exam_id).await {
            Ok(()) => {
                tracing::info!(exam_id, "exam deleted");
                self.refetch_after_change().await;
                self.toast.success("Exam deleted successfully!");
                Ok(exam_id)
            }
            Err(e) => {
                self.toast
                    .error(format!("Delete failed: {}", e.display_message("Unknown error")));
                Err(classify(e))
            }
        }
    }

    /// Flip `is_active` from the value currently displayed.
    ///
    /// This is a read-modify-write with no concurrency guard: two admins
    /// toggling at once can both send the same target value.
    pub async fn toggle_status(&mut self, exam_id: Id) -> Result<Exam, ConsoleError> {
        let displayed = self
            .exam(exam_id)
            .map(|e| e.is_active)
            .ok_or(ConsoleError::UnknownExam { id: exam_id })?;
        let update = ExamUpdate::set_active(!displayed);

        match self.backend.update_exam(exam_id, &update).await {
            Ok(updated) => {
                if updated.is_active == displayed {
                    tracing::warn!(exam_id, "server reported unchanged status after toggle");
                }
                self.refetch_after_change().await;
                self.toast.success("Exam status updated successfully!");
                Ok(updated)
            }
            Err(e) => {
                self.toast.error("Failed to update exam status");
                Err(classify(e))
            }
        }
    }
}

/// Question management for one exam.
pub struct QuestionManager<'a, B: AdminBackend + ?Sized> {
    backend: &'a B,
    exam_id: Id,
    exam: Option<Exam>,
    questions: Vec<Question>,
    toast: Toast,
    delete_modal: ConfirmModal<Id>,
    adding: SubmitGate,
    stale: bool,
}

impl<'a, B: AdminBackend + ?Sized> QuestionManager<'a, B> {
    pub fn new(backend: &'a B, exam_id: Id) -> Self {
        Self {
            backend,
            exam_id,
            exam: None,
            questions: Vec::new(),
            toast: Toast::default(),
            delete_modal: ConfirmModal::default(),
            adding: SubmitGate::new(),
            stale: false,
        }
    }

    pub fn exam(&self) -> Option<&Exam> {
        self.exam.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    pub fn delete_modal(&self) -> &ConfirmModal<Id> {
        &self.delete_modal
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Fetch the exam and its questions concurrently.
    pub async fn refresh(&mut self) -> Result<(), ConsoleError> {
        let loaded = futures::try_join!(
            self.backend.get_exam(self.exam_id),
            self.backend.list_questions(self.exam_id)
        );
        match loaded {
            Ok((exam, questions)) => {
                self.exam = Some(exam);
                self.questions = questions;
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                self.toast
                    .error(format!("Load failed: {}", e.display_message("Failed to load exam data")));
                Err(classify(e))
            }
        }
    }

    async fn refetch_after_change(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(exam_id = self.exam_id, "change saved but question re-fetch failed: {e}");
            self.stale = true;
        }
    }

    /// Parse pasted JSON and add every question in it.
    pub async fn bulk_add(&mut self, text: &str) -> Result<Vec<Question>, ConsoleError> {
        let drafts = match parse_bulk_questions(text) {
            Ok(drafts) => drafts,
            Err(e) => {
                let msg = match &e {
                    BulkAddError::MalformedJson(_) => {
                        "Invalid JSON format. Please check your input.".to_string()
                    }
                    other => other.to_string(),
                };
                self.toast.error(msg);
                return Err(e.into());
            }
        };
        let _ticket = self.adding.try_begin().ok_or(ConsoleError::Busy)?;

        match self.backend.add_questions(self.exam_id, &drafts).await {
            Ok(added) => {
                tracing::info!(exam_id = self.exam_id, count = added.len(), "questions added");
                self.refetch_after_change().await;
                self.toast
                    .success(format!("Successfully added {} question(s)", drafts.len()));
                Ok(added)
            }
            Err(e) => {
                let err = BulkAddError::Rejected(e);
                self.toast.error(err.to_string());
                match err {
                    BulkAddError::Rejected(api) if api.is_forbidden() => {
                        Err(ConsoleError::AdminRequired)
                    }
                    other => Err(other.into()),
                }
            }
        }
    }

    pub async fn update_question(
        &mut self,
        question_id: Id,
        update: &QuestionUpdate,
    ) -> Result<Question, ConsoleError> {
        if update.is_empty() {
            return Err(ConsoleError::Validation("No valid fields provided".into()));
        }
        match self.backend.update_question(question_id, update).await {
            Ok(question) => {
                self.refetch_after_change().await;
                self.toast.success("Question updated successfully");
                Ok(question)
            }
            Err(e) => {
                self.toast
                    .error(format!("Update failed: {}", e.display_message("Unknown error")));
                Err(classify(e))
            }
        }
    }

    pub fn request_delete(&mut self, question_id: Id) -> Result<(), ConsoleError> {
        let label = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .map(|q| q.question_text.clone())
            .ok_or_else(|| {
                ConsoleError::Validation(format!("question {question_id} is not part of this exam"))
            })?;
        self.delete_modal.request(question_id, label);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.delete_modal.cancel();
    }

    pub async fn confirm_delete(&mut self) -> Result<Id, ConsoleError> {
        let question_id = self
            .delete_modal
            .confirm()
            .ok_or(ConsoleError::NothingPending)?;
        match self.backend.delete_question(question_id).await {
            Ok(()) => {
                self.refetch_after_change().await;
                self.toast.success("Question deleted successfully");
                Ok(question_id)
            }
            Err(e) => {
                self.toast.error(format!(
                    "Delete failed: {}",
                    e.display_message("Failed to delete question")
                ));
                Err(classify(e))
            }
        }
    }
}
