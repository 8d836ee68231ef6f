use sqlx::Row;
use uuid::Uuid;

use lms_core::enums::decode;
use lms_core::model::{
    Course, CourseId, CourseLevel, CourseStatus, Enrollment, EnrollmentId, EnrollmentStatus,
    Lesson, LessonId, LessonProgress, User, UserId, UserRole,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn uuid_from_text(field: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|_| StorageError::Serialization(format!("{field} is not a UUID")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let role_raw: String = row.try_get("role").map_err(ser)?;
    let role: UserRole = decode(&role_raw)?;

    User::from_persisted(
        UserId::new(uuid_from_text("user id", &id)?),
        row.try_get("full_name").map_err(ser)?,
        row.try_get("email").map_err(ser)?,
        role,
        row.try_get("bio").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_course_row(row: &sqlx::sqlite::SqliteRow) -> Result<Course, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let instructor_id: String = row.try_get("instructor_id").map_err(ser)?;
    let level_raw: String = row.try_get("level").map_err(ser)?;
    let status_raw: String = row.try_get("status").map_err(ser)?;
    let level: CourseLevel = decode(&level_raw)?;
    let status: CourseStatus = decode(&status_raw)?;

    Course::new(
        CourseId::new(uuid_from_text("course id", &id)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        row.try_get::<String, _>("category").map_err(ser)?,
        level,
        status,
        UserId::new(uuid_from_text("instructor_id", &instructor_id)?),
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let course_id: String = row.try_get("course_id").map_err(ser)?;
    let position = i64_to_u32("position", row.try_get::<i64, _>("position").map_err(ser)?)?;

    Lesson::new(
        LessonId::new(uuid_from_text("lesson id", &id)?),
        CourseId::new(uuid_from_text("course_id", &course_id)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("content").map_err(ser)?,
        row.try_get("video_url").map_err(ser)?,
        position,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_enrollment_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Enrollment, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let student_id: String = row.try_get("student_id").map_err(ser)?;
    let course_id: String = row.try_get("course_id").map_err(ser)?;
    let status_raw: String = row.try_get("status").map_err(ser)?;
    let status: EnrollmentStatus = decode(&status_raw)?;

    Enrollment::from_persisted(
        EnrollmentId::new(uuid_from_text("enrollment id", &id)?),
        UserId::new(uuid_from_text("student_id", &student_id)?),
        CourseId::new(uuid_from_text("course_id", &course_id)?),
        status,
        row.try_get("progress_percent").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<LessonProgress, StorageError> {
    let enrollment_id: String = row.try_get("enrollment_id").map_err(ser)?;
    let lesson_id: String = row.try_get("lesson_id").map_err(ser)?;

    LessonProgress::from_persisted(
        EnrollmentId::new(uuid_from_text("enrollment_id", &enrollment_id)?),
        LessonId::new(uuid_from_text("lesson_id", &lesson_id)?),
        row.try_get("is_completed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}
