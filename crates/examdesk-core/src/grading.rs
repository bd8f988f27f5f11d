//! Grading flow state machine.
//!
//! `Selecting` -> `Answering` -> `Submitted` -> (reset) -> `Selecting`.
//! The server scores the submission; this module never decides correctness.

use thiserror::Error;

use crate::error::ApiError;
use crate::lettering::{is_valid_letter, valid_letters};
use crate::model::{Answers, Exam, GradeResult, Id, Question};
use crate::traits::LearnerBackend;
use crate::view_state::SubmitGate;

#[derive(Debug, Clone, Error)]
pub enum FlowError {
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("question {0} is not part of this exam")]
    UnknownQuestion(Id),

    #[error("'{answer}' is not an option; choose one of {allowed}")]
    InvalidOption { answer: String, allowed: String },

    #[error("answer at least one question before submitting")]
    NothingAnswered,

    #[error("a submission is already in progress")]
    Busy,

    #[error("{message}")]
    Api { message: String, source: ApiError },
}

impl FlowError {
    fn api(source: ApiError, fallback: &str) -> Self {
        FlowError::Api {
            message: source.display_message(fallback),
            source,
        }
    }
}

/// Where the learner is in the flow.
#[derive(Debug, Clone, PartialEq)]
pub enum GradingState {
    Selecting {
        exams: Vec<Exam>,
    },
    Answering {
        exam: Exam,
        questions: Vec<Question>,
        answers: Answers,
    },
    Submitted {
        exam: Exam,
        questions: Vec<Question>,
        answers: Answers,
        result: GradeResult,
    },
}

impl GradingState {
    fn name(&self) -> &'static str {
        match self {
            GradingState::Selecting { .. } => "selecting an exam",
            GradingState::Answering { .. } => "answering questions",
            GradingState::Submitted { .. } => "viewing a result",
        }
    }
}

pub struct GradingFlow<'a, B: LearnerBackend + ?Sized> {
    backend: &'a B,
    state: GradingState,
    gate: SubmitGate,
}

impl<'a, B: LearnerBackend + ?Sized> GradingFlow<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            state: GradingState::Selecting { exams: Vec::new() },
            gate: SubmitGate::new(),
        }
    }

    pub fn state(&self) -> &GradingState {
        &self.state
    }

    /// Refresh the list of exams to choose from.
    pub async fn load_exams(&mut self) -> Result<&[Exam], FlowError> {
        let GradingState::Selecting { .. } = self.state else {
            return Err(self.invalid("load exams"));
        };
        let exams = self
            .backend
            .available_exams()
            .await
            .map_err(|e| FlowError::api(e, "Failed to load exams. Please try again."))?;
        self.state = GradingState::Selecting { exams };
        Ok(self.exams())
    }

    /// Exams offered for selection; empty outside `Selecting`.
    pub fn exams(&self) -> &[Exam] {
        match &self.state {
            GradingState::Selecting { exams } => exams,
            _ => &[],
        }
    }

    /// Fetch the exam and its questions, then start answering.
    pub async fn select_exam(&mut self, exam_id: Id) -> Result<(), FlowError> {
        if !matches!(self.state, GradingState::Selecting { .. }) {
            return Err(self.invalid("select an exam"));
        }
        let (exam, questions) = futures::try_join!(
            self.backend.exam(exam_id),
            self.backend.exam_questions(exam_id)
        )
        .map_err(|e| FlowError::api(e, "Failed to load exam questions. Please try again."))?;

        tracing::info!(exam_id, questions = questions.len(), "exam selected");
        self.state = GradingState::Answering {
            exam,
            questions,
            answers: Answers::new(),
        };
        Ok(())
    }

    /// Record or replace the answer to one question.
    pub fn record_answer(&mut self, question_id: Id, answer: &str) -> Result<(), FlowError> {
        let state_name = self.state.name();
        let GradingState::Answering {
            questions, answers, ..
        } = &mut self.state
        else {
            return Err(FlowError::InvalidState {
                action: "record an answer",
                state: state_name,
            });
        };
        let question = questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(FlowError::UnknownQuestion(question_id))?;

        let answer = answer.trim();
        if question.is_multiple_choice() && !is_valid_letter(answer, question.options.len()) {
            return Err(FlowError::InvalidOption {
                answer: answer.to_string(),
                allowed: valid_letters(question.options.len()).join(", "),
            });
        }
        answers.insert(question_id, answer);
        Ok(())
    }

    /// Submit is enabled once at least one answer exists.
    pub fn can_submit(&self) -> bool {
        match &self.state {
            GradingState::Answering { answers, .. } => !answers.is_empty() && !self.gate.is_busy(),
            _ => false,
        }
    }

    /// Send every recorded answer and keep the server's result.
    pub async fn submit(&mut self) -> Result<GradeResult, FlowError> {
        let (exam_id, answers) = match &self.state {
            GradingState::Answering { answers, .. } if answers.is_empty() => {
                return Err(FlowError::NothingAnswered)
            }
            GradingState::Answering { exam, answers, .. } => (exam.id, answers.clone()),
            _ => return Err(self.invalid("submit")),
        };
        let _ticket = self.gate.try_begin().ok_or(FlowError::Busy)?;

        let result = self
            .backend
            .submit_graded_exam(exam_id, &answers)
            .await
            .map_err(|e| FlowError::api(e, "Failed to submit exam. Please try again."))?;
        tracing::info!(
            exam_id,
            score = result.score,
            total = result.total_marks,
            "exam graded"
        );

        let previous = std::mem::replace(
            &mut self.state,
            GradingState::Selecting { exams: Vec::new() },
        );
        self.state = match previous {
            GradingState::Answering {
                exam,
                questions,
                answers,
            } => GradingState::Submitted {
                exam,
                questions,
                answers,
                result: result.clone(),
            },
            other => other,
        };
        Ok(result)
    }

    /// "Grade another": drop all transient state.
    pub fn reset(&mut self) {
        self.state = GradingState::Selecting { exams: Vec::new() };
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidState {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{AttemptDetail, ExamAttempt, QuestionType};

    struct FakeLearner {
        submitted: Mutex<Option<Answers>>,
        fail_submit: bool,
    }

    impl FakeLearner {
        fn new() -> Self {
            Self {
                submitted: Mutex::new(None),
                fail_submit: false,
            }
        }
    }

    fn exam() -> Exam {
        Exam {
            id: 7,
            title: "Maths 1".into(),
            description: None,
            is_active: true,
            question_count: 2,
            total_marks: 3,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            has_attempted: false,
            latest_attempt: None,
        }
    }

    fn questions() -> Vec<Question> {
        vec![
            Question {
                id: 1,
                exam_id: Some(7),
                question_text: "2 + 2?".into(),
                question_type: QuestionType::MultipleChoice,
                subject: "math".into(),
                difficulty: "medium".into(),
                marks: 1,
                options: vec!["3".into(), "4".into(), "5".into()],
                correct_answer: None,
                question_context: None,
                diagram_path: None,
                user_answer: None,
            },
            Question {
                id: 2,
                exam_id: Some(7),
                question_text: "Spell four".into(),
                question_type: QuestionType::ShortAnswer,
                subject: "english".into(),
                difficulty: "medium".into(),
                marks: 2,
                options: vec![],
                correct_answer: None,
                question_context: None,
                diagram_path: None,
                user_answer: None,
            },
        ]
    }

    #[async_trait]
    impl LearnerBackend for FakeLearner {
        async fn available_exams(&self) -> Result<Vec<Exam>, ApiError> {
            Ok(vec![exam()])
        }

        async fn exam(&self, exam_id: Id) -> Result<Exam, ApiError> {
            if exam_id == 7 {
                Ok(exam())
            } else {
                Err(ApiError::NotFound {
                    message: "Exam not found".into(),
                })
            }
        }

        async fn exam_questions(&self, _: Id) -> Result<Vec<Question>, ApiError> {
            Ok(questions())
        }

        async fn attempts(&self) -> Result<Vec<ExamAttempt>, ApiError> {
            Ok(vec![])
        }

        async fn attempt_detail(&self, _: Id) -> Result<AttemptDetail, ApiError> {
            Err(ApiError::NotFound {
                message: "Exam attempt not found".into(),
            })
        }

        async fn submit_graded_exam(
            &self,
            _: Id,
            answers: &Answers,
        ) -> Result<GradeResult, ApiError> {
            if self.fail_submit {
                return Err(ApiError::Server {
                    status: 400,
                    message: Some("Exam is not active".into()),
                });
            }
            *self.submitted.lock().unwrap() = Some(answers.clone());
            Ok(GradeResult {
                score: 1,
                total_marks: 3,
                score_percentage: 33.3,
                total_questions: Some(2),
                attempt_id: Some(99),
                message: None,
            })
        }
    }

    #[tokio::test]
    async fn full_cycle() {
        let backend = FakeLearner::new();
        let mut flow = GradingFlow::new(&backend);

        assert_eq!(flow.load_exams().await.unwrap().len(), 1);
        flow.select_exam(7).await.unwrap();
        assert!(!flow.can_submit());

        flow.record_answer(1, "B").unwrap();
        flow.record_answer(2, " four ").unwrap();
        assert!(flow.can_submit());

        let result = flow.submit().await.unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.score_percentage, 33.3);

        let sent = backend.submitted.lock().unwrap().clone().unwrap();
        assert_eq!(sent.get(1), Some("B"));
        assert_eq!(sent.get(2), Some("four"));

        assert!(matches!(flow.state(), GradingState::Submitted { .. }));
        flow.reset();
        assert_eq!(flow.state(), &GradingState::Selecting { exams: vec![] });
    }

    #[tokio::test]
    async fn submit_requires_an_answer() {
        let backend = FakeLearner::new();
        let mut flow = GradingFlow::new(&backend);
        flow.select_exam(7).await.unwrap();
        assert!(matches!(flow.submit().await, Err(FlowError::NothingAnswered)));
        assert!(backend.submitted.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_bad_answers() {
        let backend = FakeLearner::new();
        let mut flow = GradingFlow::new(&backend);
        flow.select_exam(7).await.unwrap();

        assert!(matches!(
            flow.record_answer(1, "D"),
            Err(FlowError::InvalidOption { .. })
        ));
        assert!(matches!(
            flow.record_answer(42, "A"),
            Err(FlowError::UnknownQuestion(42))
        ));
    }

    #[tokio::test]
    async fn transitions_are_checked() {
        let backend = FakeLearner::new();
        let mut flow = GradingFlow::new(&backend);
        assert!(matches!(
            flow.record_answer(1, "A"),
            Err(FlowError::InvalidState { .. })
        ));
        assert!(matches!(flow.submit().await, Err(FlowError::InvalidState { .. })));

        flow.select_exam(7).await.unwrap();
        assert!(matches!(
            flow.select_exam(7).await,
            Err(FlowError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn server_rejection_keeps_answers() {
        let backend = FakeLearner {
            submitted: Mutex::new(None),
            fail_submit: true,
        };
        let mut flow = GradingFlow::new(&backend);
        flow.select_exam(7).await.unwrap();
        flow.record_answer(1, "A").unwrap();

        let err = flow.submit().await.unwrap_err();
        assert_eq!(err.to_string(), "Exam is not active");
        assert!(flow.can_submit());
    }

    #[tokio::test]
    async fn unknown_exam_stays_selecting() {
        let backend = FakeLearner::new();
        let mut flow = GradingFlow::new(&backend);
        assert!(flow.select_exam(3).await.is_err());
        assert!(matches!(flow.state(), GradingState::Selecting { .. }));
    }
}
