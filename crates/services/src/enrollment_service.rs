use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use lms_core::model::{CourseId, Enrollment, EnrollmentId, EnrollmentStatus, UserId};
use lms_core::time::Clock;
use storage::repository::{
    CourseRepository, EnrollmentRepository, StorageError, UserRepository,
};

use crate::error::EnrollmentError;

/// Completion certificate for a finished enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate {
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub course_title: String,
    pub student_id: UserId,
    pub student_name: String,
    pub issued_at: DateTime<Utc>,
    pub progress_percent: f64,
}

/// Orchestrates enrollment lifecycle outside of progress tracking.
pub struct EnrollmentService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            courses,
            enrollments,
        }
    }

    /// Enrolls a student in a course: active, zero progress.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::CourseNotFound` for a missing course,
    /// `CourseNotOpen` for an unpublished one, `AlreadyEnrolled` when the
    /// (student, course) pair already exists, and `Storage` for other
    /// persistence failures.
    pub async fn enroll(
        &self,
        student_id: UserId,
        course_id: CourseId,
    ) -> Result<Enrollment, EnrollmentError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(EnrollmentError::CourseNotFound)?;
        if !course.is_published() {
            return Err(EnrollmentError::CourseNotOpen);
        }

        let enrollment = Enrollment::new(
            EnrollmentId::random(),
            student_id,
            course_id,
            self.clock.now(),
        );
        match self.enrollments.insert_enrollment(&enrollment).await {
            Ok(()) => {
                debug!(enrollment_id = %enrollment.id(), %student_id, %course_id, "enrolled");
                Ok(enrollment)
            }
            Err(StorageError::Conflict) => Err(EnrollmentError::AlreadyEnrolled),
            Err(e) => Err(e.into()),
        }
    }

    /// All enrollments held by a student.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::Storage` if repository access fails.
    pub async fn enrollments_for_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Enrollment>, EnrollmentError> {
        Ok(self
            .enrollments
            .list_enrollments_by_student(student_id)
            .await?)
    }

    /// All enrollments in a course.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::Storage` if repository access fails.
    pub async fn enrollments_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Enrollment>, EnrollmentError> {
        Ok(self
            .enrollments
            .list_enrollments_by_course(course_id)
            .await?)
    }

    /// Issues a completion certificate for a finished enrollment.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::EnrollmentNotFound`, `CourseNotFound`, or
    /// `StudentNotFound` for missing entities and `NotCompleted` unless
    /// the enrollment sits at 100% with `Completed` status.
    pub async fn certificate(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Certificate, EnrollmentError> {
        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(EnrollmentError::EnrollmentNotFound)?;
        let course = self
            .courses
            .get_course(enrollment.course_id())
            .await?
            .ok_or(EnrollmentError::CourseNotFound)?;
        let student = self
            .users
            .get_user(enrollment.student_id())
            .await?
            .ok_or(EnrollmentError::StudentNotFound)?;

        if enrollment.progress_percent() < 100.0
            || enrollment.status() != EnrollmentStatus::Completed
        {
            return Err(EnrollmentError::NotCompleted);
        }

        Ok(Certificate {
            enrollment_id: enrollment.id(),
            course_id: course.id(),
            course_title: course.title().to_owned(),
            student_id: student.id(),
            student_name: student.full_name().to_owned(),
            issued_at: enrollment.updated_at(),
            progress_percent: enrollment.progress_percent(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{Course, CourseLevel, CourseStatus, User, UserRole};
    use lms_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn build_service(repo: &InMemoryRepository) -> EnrollmentService {
        EnrollmentService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn seed_course(repo: &InMemoryRepository, status: CourseStatus) -> Course {
        let course = Course::new(
            CourseId::random(),
            "Rust 101",
            "intro",
            "programming",
            CourseLevel::Beginner,
            status,
            UserId::random(),
            fixed_now(),
        )
        .unwrap();
        repo.upsert_course(&course).await.unwrap();
        course
    }

    #[tokio::test]
    async fn enroll_creates_active_enrollment() {
        let repo = InMemoryRepository::new();
        let course = seed_course(&repo, CourseStatus::Published).await;
        let service = build_service(&repo);

        let enrollment = service.enroll(UserId::random(), course.id()).await.unwrap();
        assert_eq!(enrollment.status(), EnrollmentStatus::Active);
        assert!(enrollment.progress_percent().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn enroll_rejects_missing_course() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);

        let err = service
            .enroll(UserId::random(), CourseId::random())
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentError::CourseNotFound));
    }

    #[tokio::test]
    async fn enroll_rejects_draft_course() {
        let repo = InMemoryRepository::new();
        let course = seed_course(&repo, CourseStatus::Draft).await;
        let service = build_service(&repo);

        let err = service
            .enroll(UserId::random(), course.id())
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentError::CourseNotOpen));
    }

    #[tokio::test]
    async fn enroll_twice_is_already_enrolled() {
        let repo = InMemoryRepository::new();
        let course = seed_course(&repo, CourseStatus::Published).await;
        let service = build_service(&repo);
        let student_id = UserId::random();

        service.enroll(student_id, course.id()).await.unwrap();
        let err = service.enroll(student_id, course.id()).await.unwrap_err();
        assert!(matches!(err, EnrollmentError::AlreadyEnrolled));
    }

    #[tokio::test]
    async fn certificate_requires_completion() {
        let repo = InMemoryRepository::new();
        let course = seed_course(&repo, CourseStatus::Published).await;
        let student = User::new(
            UserId::random(),
            "Dana Reyes",
            "dana@example.test",
            UserRole::Student,
            None,
            fixed_now(),
        )
        .unwrap();
        repo.upsert_user(&student).await.unwrap();

        let service = build_service(&repo);
        let enrollment = service.enroll(student.id(), course.id()).await.unwrap();

        let err = service.certificate(enrollment.id()).await.unwrap_err();
        assert!(matches!(err, EnrollmentError::NotCompleted));
    }
}
