use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use lms_core::enums::UnknownEnumValue;
use lms_core::model::{
    Course, CourseId, Enrollment, EnrollmentId, EnrollmentStatus, Lesson, LessonId,
    LessonProgress, User, UserId, UserRole,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint rejected the write (duplicate enrollment,
    /// racing insert on the same progress pair).
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored enum column held a value no variant matches. Data
    /// integrity, not user input; never coerced to a default.
    #[error(transparent)]
    Integrity(#[from] UnknownEnumValue),
}

/// Total and completed enrollment counts across the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrollmentCounts {
    pub total: u64,
    pub completed: u64,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist or update a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Fetch a user by ID; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Count users holding the given role.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn count_users_by_role(&self, role: UserRole) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or update a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Count all courses.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn count_courses(&self) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist or update a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a lesson by ID; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// All lessons of a course, ordered by position, then creation time,
    /// then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_lessons_by_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Insert a new enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the (student, course) pair is
    /// already enrolled.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// Fetch an enrollment by ID; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn get_enrollment(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// All enrollments held by a student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_enrollments_by_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Enrollment>, StorageError>;

    /// All enrollments in a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_enrollments_by_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Enrollment>, StorageError>;

    /// Platform-wide enrollment totals.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn count_enrollments(&self) -> Result<EnrollmentCounts, StorageError>;
}

/// The progress ledger: per-(enrollment, lesson) completion records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record for one (enrollment, lesson) pair; `Ok(None)` when
    /// the pair has never been touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn get_progress(
        &self,
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// All records for an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Vec<LessonProgress>, StorageError>;

    /// IDs of lessons the enrollment has completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn completed_lesson_ids(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<HashSet<LessonId>, StorageError>;

    /// Persist a ledger record together with the recomputed enrollment
    /// aggregate, atomically: both commit or neither does.
    ///
    /// The ledger write upserts by (enrollment, lesson) — a second write
    /// for the same pair, including one racing through the storage unique
    /// key, updates the existing record instead of adding a row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure; the transaction is
    /// rolled back.
    async fn save_progress(
        &self,
        record: &LessonProgress,
        enrollment: &Enrollment,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    enrollments: Arc<Mutex<HashMap<EnrollmentId, Enrollment>>>,
    progress: Arc<Mutex<HashMap<(EnrollmentId, LessonId), LessonProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(
    mutex: &'a Mutex<T>,
) -> Result<std::sync::MutexGuard<'a, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        lock(&self.users)?.insert(user.id(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<u64, StorageError> {
        let count = lock(&self.users)?
            .values()
            .filter(|u| u.role() == role)
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        lock(&self.courses)?.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(lock(&self.courses)?.get(&id).cloned())
    }

    async fn count_courses(&self) -> Result<u64, StorageError> {
        Ok(lock(&self.courses)?.len() as u64)
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        lock(&self.lessons)?.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        Ok(lock(&self.lessons)?.get(&id).cloned())
    }

    async fn list_lessons_by_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let mut lessons: Vec<Lesson> = lock(&self.lessons)?
            .values()
            .filter(|l| l.course_id() == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.position(), l.created_at(), l.id()));
        Ok(lessons)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = lock(&self.enrollments)?;
        let duplicate = guard.values().any(|e| {
            e.student_id() == enrollment.student_id() && e.course_id() == enrollment.course_id()
        });
        if duplicate {
            return Err(StorageError::Conflict);
        }
        guard.insert(enrollment.id(), enrollment.clone());
        Ok(())
    }

    async fn get_enrollment(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, StorageError> {
        Ok(lock(&self.enrollments)?.get(&id).cloned())
    }

    async fn list_enrollments_by_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let mut enrollments: Vec<Enrollment> = lock(&self.enrollments)?
            .values()
            .filter(|e| e.student_id() == student_id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| (e.created_at(), e.id()));
        Ok(enrollments)
    }

    async fn list_enrollments_by_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let mut enrollments: Vec<Enrollment> = lock(&self.enrollments)?
            .values()
            .filter(|e| e.course_id() == course_id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| (e.created_at(), e.id()));
        Ok(enrollments)
    }

    async fn count_enrollments(&self) -> Result<EnrollmentCounts, StorageError> {
        let guard = lock(&self.enrollments)?;
        let total = guard.len() as u64;
        let completed = guard
            .values()
            .filter(|e| e.status() == EnrollmentStatus::Completed)
            .count() as u64;
        Ok(EnrollmentCounts { total, completed })
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        Ok(lock(&self.progress)?
            .get(&(enrollment_id, lesson_id))
            .cloned())
    }

    async fn list_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let mut records: Vec<LessonProgress> = lock(&self.progress)?
            .values()
            .filter(|p| p.enrollment_id() == enrollment_id)
            .cloned()
            .collect();
        records.sort_by_key(LessonProgress::lesson_id);
        Ok(records)
    }

    async fn completed_lesson_ids(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<HashSet<LessonId>, StorageError> {
        Ok(lock(&self.progress)?
            .values()
            .filter(|p| p.enrollment_id() == enrollment_id && p.is_completed())
            .map(LessonProgress::lesson_id)
            .collect())
    }

    async fn save_progress(
        &self,
        record: &LessonProgress,
        enrollment: &Enrollment,
    ) -> Result<(), StorageError> {
        // Both guards held for the duration of the write, so no reader
        // sees the ledger updated without the aggregate.
        let mut progress = lock(&self.progress)?;
        let mut enrollments = lock(&self.enrollments)?;
        if !enrollments.contains_key(&enrollment.id()) {
            return Err(StorageError::NotFound);
        }
        progress.insert(
            (record.enrollment_id(), record.lesson_id()),
            record.clone(),
        );
        enrollments.insert(enrollment.id(), enrollment.clone());
        Ok(())
    }
}

//
// ─── STORAGE ───────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
