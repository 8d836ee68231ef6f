//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("enrollment not found")]
    EnrollmentNotFound,

    #[error("lesson not found")]
    LessonNotFound,

    #[error("lesson does not belong to the enrollment's course")]
    LessonNotInCourse,

    /// The sequential gate rejected the completion. Carries the lowest
    /// unmet prerequisite so the caller can tell the student what to
    /// finish first.
    #[error("complete lesson {position} ({title}) before marking this lesson complete")]
    PrerequisiteNotMet { position: u32, title: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("course not found")]
    CourseNotFound,

    #[error("course is not open for enrollment")]
    CourseNotOpen,

    #[error("already enrolled in this course")]
    AlreadyEnrolled,

    #[error("enrollment not found")]
    EnrollmentNotFound,

    #[error("student not found")]
    StudentNotFound,

    #[error("certificate is only available after course completion")]
    NotCompleted,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
