use std::collections::HashSet;

use sqlx::Row;

use lms_core::enums::encode;
use lms_core::model::{Enrollment, EnrollmentId, LessonId, LessonProgress};

use super::{SqliteRepository, mapping};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT enrollment_id, lesson_id, is_completed, completed_at
            FROM lesson_progress
            WHERE enrollment_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(enrollment_id.to_string())
        .bind(lesson_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(mapping::map_progress_row).transpose()
    }

    async fn list_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT enrollment_id, lesson_id, is_completed, completed_at
            FROM lesson_progress
            WHERE enrollment_id = ?1
            ORDER BY lesson_id ASC
            ",
        )
        .bind(enrollment_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(mapping::map_progress_row(&row)?);
        }
        Ok(records)
    }

    async fn completed_lesson_ids(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<HashSet<LessonId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lesson_id
            FROM lesson_progress
            WHERE enrollment_id = ?1 AND is_completed = 1
            ",
        )
        .bind(enrollment_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("lesson_id").map_err(mapping::ser)?;
            ids.insert(LessonId::new(mapping::uuid_from_text("lesson_id", &raw)?));
        }
        Ok(ids)
    }

    async fn save_progress(
        &self,
        record: &LessonProgress,
        enrollment: &Enrollment,
    ) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // The unique (enrollment_id, lesson_id) key turns a racing second
        // insert into an update of the existing row.
        sqlx::query(
            r"
            INSERT INTO lesson_progress (enrollment_id, lesson_id, is_completed, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(enrollment_id, lesson_id) DO UPDATE SET
                is_completed = excluded.is_completed,
                completed_at = excluded.completed_at
            ",
        )
        .bind(record.enrollment_id().to_string())
        .bind(record.lesson_id().to_string())
        .bind(record.is_completed())
        .bind(record.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let updated = sqlx::query(
            r"
            UPDATE enrollments
            SET status = ?2, progress_percent = ?3, updated_at = ?4
            WHERE id = ?1
            ",
        )
        .bind(enrollment.id().to_string())
        .bind(encode(enrollment.status()))
        .bind(enrollment.progress_percent())
        .bind(enrollment.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls the ledger write back too.
            return Err(StorageError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
