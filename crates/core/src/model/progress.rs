use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{EnrollmentId, LessonId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressRecordError {
    #[error("completed record is missing its completion timestamp")]
    MissingCompletedAt,

    #[error("incomplete record carries a completion timestamp")]
    UnexpectedCompletedAt,
}

/// Per-lesson completion record for one enrollment.
///
/// Identified by the (enrollment, lesson) pair; there is never more than
/// one record per pair. `completed_at` is present exactly when
/// `is_completed` is true, which the constructors and transitions enforce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    enrollment_id: EnrollmentId,
    lesson_id: LessonId,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// Creates an incomplete record for the pair.
    #[must_use]
    pub fn new(enrollment_id: EnrollmentId, lesson_id: LessonId) -> Self {
        Self {
            enrollment_id,
            lesson_id,
            is_completed: false,
            completed_at: None,
        }
    }

    /// Rebuilds a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressRecordError` if the completion flag and timestamp
    /// disagree.
    pub fn from_persisted(
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressRecordError> {
        match (is_completed, completed_at.is_some()) {
            (true, false) => return Err(ProgressRecordError::MissingCompletedAt),
            (false, true) => return Err(ProgressRecordError::UnexpectedCompletedAt),
            _ => {}
        }

        Ok(Self {
            enrollment_id,
            lesson_id,
            is_completed,
            completed_at,
        })
    }

    /// Marks the lesson complete at the given time. Idempotent apart from
    /// refreshing the timestamp.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(now);
    }

    /// Clears the completion flag and timestamp.
    pub fn reset(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }

    // Accessors
    #[must_use]
    pub fn enrollment_id(&self) -> EnrollmentId {
        self.enrollment_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_record_is_incomplete() {
        let record = LessonProgress::new(EnrollmentId::random(), LessonId::random());
        assert!(!record.is_completed());
        assert_eq!(record.completed_at(), None);
    }

    #[test]
    fn complete_then_reset_keeps_timestamp_invariant() {
        let mut record = LessonProgress::new(EnrollmentId::random(), LessonId::random());
        record.complete(fixed_now());
        assert!(record.is_completed());
        assert_eq!(record.completed_at(), Some(fixed_now()));

        record.reset();
        assert!(!record.is_completed());
        assert_eq!(record.completed_at(), None);
    }

    #[test]
    fn from_persisted_rejects_mismatched_flag_and_timestamp() {
        let err = LessonProgress::from_persisted(
            EnrollmentId::random(),
            LessonId::random(),
            true,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressRecordError::MissingCompletedAt);

        let err = LessonProgress::from_persisted(
            EnrollmentId::random(),
            LessonId::random(),
            false,
            Some(fixed_now()),
        )
        .unwrap_err();
        assert_eq!(err, ProgressRecordError::UnexpectedCompletedAt);
    }
}
