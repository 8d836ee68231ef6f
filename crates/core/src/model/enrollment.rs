use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::{PersistedEnum, StoredCase};
use crate::model::ids::{CourseId, EnrollmentId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("progress percent must be a finite value between 0 and 100")]
    InvalidProgressPercent,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of an enrollment.
///
/// `Active` and `Completed` are derived from progress; `Cancelled` is only
/// ever set out of band and is never produced by recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl PersistedEnum for EnrollmentStatus {
    const NAME: &'static str = "enrollment status";
    const STORED_CASE: StoredCase = StoredCase::Lower;
    const VARIANTS: &'static [Self] = &[
        EnrollmentStatus::Active,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Cancelled,
    ];

    fn tag(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }
}

//
// ─── ENROLLMENT ────────────────────────────────────────────────────────────────
//

/// Links one student to one course and carries the derived progress
/// aggregate.
///
/// `progress_percent` and `status` are recomputed from the lesson progress
/// ledger; nothing else writes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    id: EnrollmentId,
    student_id: UserId,
    course_id: CourseId,
    status: EnrollmentStatus,
    progress_percent: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Creates a fresh enrollment: active, zero progress.
    #[must_use]
    pub fn new(
        id: EnrollmentId,
        student_id: UserId,
        course_id: CourseId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student_id,
            course_id,
            status: EnrollmentStatus::Active,
            progress_percent: 0.0,
            created_at,
            updated_at: created_at,
        }
    }

    /// Rebuilds an enrollment from storage.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::InvalidProgressPercent` if the persisted
    /// percent is outside 0–100 or not finite.
    pub fn from_persisted(
        id: EnrollmentId,
        student_id: UserId,
        course_id: CourseId,
        status: EnrollmentStatus,
        progress_percent: f64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, EnrollmentError> {
        if !progress_percent.is_finite() || !(0.0..=100.0).contains(&progress_percent) {
            return Err(EnrollmentError::InvalidProgressPercent);
        }

        Ok(Self {
            id,
            student_id,
            course_id,
            status,
            progress_percent,
            created_at,
            updated_at,
        })
    }

    /// Recomputes the progress aggregate from ledger counts.
    ///
    /// Percent is `completed / total * 100` rounded to two decimals; a
    /// course with no lessons yields 0.0 rather than dividing by zero. The
    /// status flips to `Completed` at 100% and back to `Active` below it,
    /// so un-completing a lesson reverses a completed enrollment. This
    /// never assigns `Cancelled`.
    pub fn apply_progress(&mut self, completed: usize, total: usize, now: DateTime<Utc>) {
        self.progress_percent = if total == 0 {
            0.0
        } else {
            // Lesson counts stay far below the point where f64 loses
            // integer precision.
            #[allow(clippy::cast_precision_loss)]
            let raw = completed as f64 / total as f64 * 100.0;
            (raw * 100.0).round() / 100.0
        };
        self.status = if self.progress_percent >= 100.0 {
            EnrollmentStatus::Completed
        } else {
            EnrollmentStatus::Active
        };
        self.updated_at = now;
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> EnrollmentId {
        self.id
    }

    #[must_use]
    pub fn student_id(&self) -> UserId {
        self.student_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
