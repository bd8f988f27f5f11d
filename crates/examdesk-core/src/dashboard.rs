//! Learner dashboard: available exams and attempt history.

use std::fmt;
use std::str::FromStr;

use crate::cancel::CancelToken;
use crate::error::ApiError;
use crate::model::{Exam, ExamAttempt};
use crate::presentation::{most_recent_attempt, Bucket};
use crate::traits::LearnerBackend;

/// Which half of the dashboard is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DashboardTab {
    #[default]
    Available,
    History,
}

impl fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardTab::Available => write!(f, "available"),
            DashboardTab::History => write!(f, "history"),
        }
    }
}

impl FromStr for DashboardTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" | "exams" => Ok(DashboardTab::Available),
            "history" => Ok(DashboardTab::History),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}

/// An exam the learner may take, with their latest attempt at it.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableExamCard {
    pub exam: Exam,
    pub last_attempt: Option<ExamAttempt>,
}

/// One row of the attempt history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub attempt: ExamAttempt,
    pub percentage: f64,
    pub bucket: Bucket,
}

impl HistoryRow {
    pub fn new(attempt: ExamAttempt) -> Self {
        let percentage = attempt.computed_percentage();
        Self {
            bucket: Bucket::from_percentage(percentage),
            percentage,
            attempt,
        }
    }
}

/// Both dashboard views, built from one load.
#[derive(Debug, Clone, Default)]
pub struct LearnerDashboard {
    pub tab: DashboardTab,
    pub available: Vec<AvailableExamCard>,
    pub history: Vec<HistoryRow>,
}

impl LearnerDashboard {
    /// Fetch active exams and attempt history concurrently.
    ///
    /// Nothing is returned once `token` is cancelled.
    pub async fn load<B: LearnerBackend + ?Sized>(
        backend: &B,
        token: &CancelToken,
    ) -> Result<Self, ApiError> {
        let (exams, attempts) = token
            .run(async { futures::try_join!(backend.available_exams(), backend.attempts()) })
            .await?;
        tracing::debug!(
            exams = exams.len(),
            attempts = attempts.len(),
            "dashboard loaded"
        );
        Ok(Self::build(exams, attempts))
    }

    /// Assemble the views from already-fetched data.
    pub fn build(exams: Vec<Exam>, attempts: Vec<ExamAttempt>) -> Self {
        let available = exams
            .into_iter()
            .filter(|e| e.is_active)
            .map(|exam| {
                let last_attempt = most_recent_attempt(&attempts, exam.id)
                    .cloned()
                    .or_else(|| exam.latest_attempt.clone());
                AvailableExamCard { exam, last_attempt }
            })
            .collect();
        let history = attempts.into_iter().map(HistoryRow::new).collect();

        Self {
            tab: DashboardTab::default(),
            available,
            history,
        }
    }

    pub fn switch_tab(&mut self, tab: DashboardTab) {
        self.tab = tab;
    }
}
