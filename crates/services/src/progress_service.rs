use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use lms_core::model::{
    EnrollmentId, EnrollmentStatus, Lesson, LessonId, LessonProgress,
};
use lms_core::time::Clock;
use storage::repository::{EnrollmentRepository, LessonRepository, ProgressRepository};

use crate::error::ProgressError;

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Updated aggregate handed back to callers after a progress write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentSnapshot {
    pub enrollment_id: EnrollmentId,
    pub progress_percent: f64,
    pub status: EnrollmentStatus,
}

//
// ─── SEQUENTIAL GATE ───────────────────────────────────────────────────────────
//

/// Verifies that every lesson positioned below the target is complete.
///
/// `course_lessons` must be ordered ascending by position, so the first
/// incomplete prerequisite found is the lowest-positioned one — the error
/// always names the same lesson for the same ledger state. Lessons sharing
/// the target's position are not prerequisites.
fn check_sequential_gate(
    target: &Lesson,
    course_lessons: &[Lesson],
    completed: &HashSet<LessonId>,
) -> Result<(), ProgressError> {
    let prerequisites = course_lessons
        .iter()
        .filter(|l| l.position() < target.position());

    for prerequisite in prerequisites {
        if !completed.contains(&prerequisite.id()) {
            return Err(ProgressError::PrerequisiteNotMet {
                position: prerequisite.position(),
                title: prerequisite.title().to_owned(),
            });
        }
    }
    Ok(())
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Owns the lesson-progress write path.
///
/// Every mutation flows through `mark_lesson_progress`: gate check, ledger
/// upsert, aggregate recomputation, one atomic save. Nothing else writes
/// `progress_percent` or flips the enrollment status, so the aggregate can
/// never drift from the ledger.
pub struct ProgressService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            enrollments,
            progress,
        }
    }

    /// Marks a lesson complete or incomplete for an enrollment and returns
    /// the recomputed aggregate.
    ///
    /// Completion is gated: all lower-positioned lessons of the course
    /// must already be complete. Un-completing is never gated. The ledger
    /// record for the (enrollment, lesson) pair is updated in place — a
    /// repeat completion is idempotent and never adds a second record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EnrollmentNotFound` or `LessonNotFound` for
    /// missing entities, `LessonNotInCourse` when the lesson belongs to a
    /// different course, `PrerequisiteNotMet` when the gate rejects the
    /// completion, and `ProgressError::Storage` for persistence failures.
    pub async fn mark_lesson_progress(
        &self,
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
        completed: bool,
    ) -> Result<EnrollmentSnapshot, ProgressError> {
        debug!(%enrollment_id, %lesson_id, completed, "marking lesson progress");

        let mut enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(ProgressError::EnrollmentNotFound)?;
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(ProgressError::LessonNotFound)?;
        if lesson.course_id() != enrollment.course_id() {
            return Err(ProgressError::LessonNotInCourse);
        }

        let course_lessons = self
            .lessons
            .list_lessons_by_course(enrollment.course_id())
            .await?;
        let mut completed_ids = self.progress.completed_lesson_ids(enrollment_id).await?;

        if completed {
            check_sequential_gate(&lesson, &course_lessons, &completed_ids)?;
        }

        let now = self.clock.now();
        let mut record = self
            .progress
            .get_progress(enrollment_id, lesson_id)
            .await?
            .unwrap_or_else(|| LessonProgress::new(enrollment_id, lesson_id));
        if completed {
            record.complete(now);
            completed_ids.insert(lesson_id);
        } else {
            record.reset();
            completed_ids.remove(&lesson_id);
        }

        // Count only ledger entries that still map to a lesson of this
        // course, so orphaned records cannot inflate the percentage.
        let done = course_lessons
            .iter()
            .filter(|l| completed_ids.contains(&l.id()))
            .count();
        let previous_status = enrollment.status();
        enrollment.apply_progress(done, course_lessons.len(), now);

        self.progress.save_progress(&record, &enrollment).await?;

        if previous_status != enrollment.status() {
            info!(
                %enrollment_id,
                from = ?previous_status,
                to = ?enrollment.status(),
                "enrollment status changed",
            );
        }

        Ok(EnrollmentSnapshot {
            enrollment_id: enrollment.id(),
            progress_percent: enrollment.progress_percent(),
            status: enrollment.status(),
        })
    }

    /// All per-lesson completion records for an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EnrollmentNotFound` for a missing
    /// enrollment, `ProgressError::Storage` for persistence failures.
    pub async fn list_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Vec<LessonProgress>, ProgressError> {
        self.enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(ProgressError::EnrollmentNotFound)?;
        Ok(self.progress.list_progress(enrollment_id).await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::CourseId;
    use lms_core::time::fixed_now;

    fn build_lesson(course_id: CourseId, position: u32) -> Lesson {
        Lesson::new(
            LessonId::random(),
            course_id,
            format!("Lesson {position}"),
            "body",
            None,
            position,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn gate_allows_first_lesson_unconditionally() {
        let course_id = CourseId::random();
        let lessons = vec![
            build_lesson(course_id, 1),
            build_lesson(course_id, 2),
            build_lesson(course_id, 3),
        ];
        let completed = HashSet::new();

        assert!(check_sequential_gate(&lessons[0], &lessons, &completed).is_ok());
    }

    #[test]
    fn gate_names_lowest_missing_prerequisite() {
        let course_id = CourseId::random();
        let lessons = vec![
            build_lesson(course_id, 1),
            build_lesson(course_id, 2),
            build_lesson(course_id, 3),
        ];
        let completed = HashSet::new();

        let err = check_sequential_gate(&lessons[2], &lessons, &completed).unwrap_err();
        match err {
            ProgressError::PrerequisiteNotMet { position, title } => {
                assert_eq!(position, 1);
                assert_eq!(title, "Lesson 1");
            }
            other => panic!("expected PrerequisiteNotMet, got {other:?}"),
        }
    }

    #[test]
    fn gate_reports_next_gap_once_earlier_lessons_complete() {
        let course_id = CourseId::random();
        let lessons = vec![
            build_lesson(course_id, 1),
            build_lesson(course_id, 2),
            build_lesson(course_id, 3),
        ];
        let completed: HashSet<LessonId> = [lessons[0].id()].into_iter().collect();

        let err = check_sequential_gate(&lessons[2], &lessons, &completed).unwrap_err();
        match err {
            ProgressError::PrerequisiteNotMet { position, .. } => assert_eq!(position, 2),
            other => panic!("expected PrerequisiteNotMet, got {other:?}"),
        }
    }

    #[test]
    fn gate_passes_when_all_prerequisites_complete() {
        let course_id = CourseId::random();
        let lessons = vec![
            build_lesson(course_id, 1),
            build_lesson(course_id, 2),
            build_lesson(course_id, 3),
        ];
        let completed: HashSet<LessonId> =
            [lessons[0].id(), lessons[1].id()].into_iter().collect();

        assert!(check_sequential_gate(&lessons[2], &lessons, &completed).is_ok());
    }

    #[test]
    fn gate_ignores_lessons_sharing_the_target_position() {
        let course_id = CourseId::random();
        let lessons = vec![
            build_lesson(course_id, 1),
            build_lesson(course_id, 2),
            build_lesson(course_id, 2),
        ];
        let completed: HashSet<LessonId> = [lessons[0].id()].into_iter().collect();

        // The sibling at position 2 is not a prerequisite of the target.
        assert!(check_sequential_gate(&lessons[2], &lessons, &completed).is_ok());
    }
}
