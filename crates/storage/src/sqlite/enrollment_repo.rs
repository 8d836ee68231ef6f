use sqlx::Row;

use lms_core::enums::encode;
use lms_core::model::{CourseId, Enrollment, EnrollmentId, EnrollmentStatus, UserId};

use super::{SqliteRepository, mapping::map_enrollment_row, mapping::ser};
use crate::repository::{EnrollmentCounts, EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO enrollments (
                id, student_id, course_id, status, progress_percent, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(enrollment.id().to_string())
        .bind(enrollment.student_id().to_string())
        .bind(enrollment.course_id().to_string())
        .bind(encode(enrollment.status()))
        .bind(enrollment.progress_percent())
        .bind(enrollment.created_at())
        .bind(enrollment.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            _ => StorageError::Connection(e.to_string()),
        })?;

        Ok(())
    }

    async fn get_enrollment(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, student_id, course_id, status, progress_percent, created_at, updated_at
            FROM enrollments
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn list_enrollments_by_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, student_id, course_id, status, progress_percent, created_at, updated_at
            FROM enrollments
            WHERE student_id = ?1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(student_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut enrollments = Vec::with_capacity(rows.len());
        for row in rows {
            enrollments.push(map_enrollment_row(&row)?);
        }
        Ok(enrollments)
    }

    async fn list_enrollments_by_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, student_id, course_id, status, progress_percent, created_at, updated_at
            FROM enrollments
            WHERE course_id = ?1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut enrollments = Vec::with_capacity(rows.len());
        for row in rows {
            enrollments.push(map_enrollment_row(&row)?);
        }
        Ok(enrollments)
    }

    async fn count_enrollments(&self) -> Result<EnrollmentCounts, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0) AS completed
            FROM enrollments
            ",
        )
        .bind(encode(EnrollmentStatus::Completed))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let total: i64 = row.try_get("total").map_err(ser)?;
        let completed: i64 = row.try_get("completed").map_err(ser)?;
        Ok(EnrollmentCounts {
            total: u64::try_from(total)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
            completed: u64::try_from(completed)
                .map_err(|_| StorageError::Serialization("negative count".into()))?,
        })
    }
}
