//! Presentation helpers: percentage buckets and attempt selection.

use std::fmt;

use crate::model::{ExamAttempt, Id};

/// Display class for a score percentage. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Excellent,
    Good,
    Average,
    Poor,
}

impl Bucket {
    /// `>= 80` excellent, `>= 60` good, `>= 40` average, else poor.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Bucket::Excellent
        } else if percentage >= 60.0 {
            Bucket::Good
        } else if percentage >= 40.0 {
            Bucket::Average
        } else {
            Bucket::Poor
        }
    }

    pub fn as_class(&self) -> &'static str {
        match self {
            Bucket::Excellent => "excellent",
            Bucket::Good => "good",
            Bucket::Average => "average",
            Bucket::Poor => "poor",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_class())
    }
}

/// Shorthand for [`Bucket::from_percentage`].
pub fn bucket(percentage: f64) -> Bucket {
    Bucket::from_percentage(percentage)
}

/// The attempt for `exam_id` with the latest `started_at`, if any.
///
/// Ties keep the attempt that appears first in `attempts`.
pub fn most_recent_attempt(attempts: &[ExamAttempt], exam_id: Id) -> Option<&ExamAttempt> {
    attempts
        .iter()
        .filter(|a| a.exam_id == exam_id)
        .fold(None, |best: Option<&ExamAttempt>, a| match best {
            Some(b) if b.started_at >= a.started_at => Some(b),
            _ => Some(a),
        })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::AttemptStatus;

    fn attempt(id: Id, exam_id: Id, day: u32) -> ExamAttempt {
        ExamAttempt {
            id,
            user_id: 1,
            exam_id,
            exam_title: None,
            score: 0,
            total_marks: 0,
            score_percentage: 0.0,
            total_questions: None,
            duration_minutes: None,
            status: AttemptStatus::Completed,
            started_at: Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(bucket(100.0), Bucket::Excellent);
        assert_eq!(bucket(80.0), Bucket::Excellent);
        assert_eq!(bucket(79.9), Bucket::Good);
        assert_eq!(bucket(60.0), Bucket::Good);
        assert_eq!(bucket(59.9), Bucket::Average);
        assert_eq!(bucket(40.0), Bucket::Average);
        assert_eq!(bucket(39.9), Bucket::Poor);
        assert_eq!(bucket(0.0), Bucket::Poor);
        assert_eq!(bucket(-5.0).as_class(), "poor");
    }

    #[test]
    fn bucket_is_exhaustive_over_range() {
        for tenth in 0..=1000 {
            let p = f64::from(tenth) / 10.0;
            let expected = if p >= 80.0 {
                "excellent"
            } else if p >= 60.0 {
                "good"
            } else if p >= 40.0 {
                "average"
            } else {
                "poor"
            };
            assert_eq!(bucket(p).as_class(), expected, "p = {p}");
        }
    }

    #[test]
    fn most_recent_picks_latest_start() {
        let attempts = vec![attempt(1, 5, 3), attempt(2, 5, 9), attempt(3, 6, 20), attempt(4, 5, 7)];
        assert_eq!(most_recent_attempt(&attempts, 5).map(|a| a.id), Some(2));
        assert_eq!(most_recent_attempt(&attempts, 6).map(|a| a.id), Some(3));
    }

    #[test]
    fn most_recent_absent_when_no_match() {
        let attempts = vec![attempt(1, 5, 3)];
        assert!(most_recent_attempt(&attempts, 99).is_none());
        assert!(most_recent_attempt(&[], 5).is_none());
    }
}
