use lms_core::model::{
    Course, CourseId, CourseLevel, CourseStatus, Enrollment, EnrollmentId, EnrollmentStatus,
    Lesson, LessonId, LessonProgress, User, UserId, UserRole,
};
use lms_core::time::fixed_now;
use storage::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, ProgressRepository, StorageError,
    UserRepository,
};
use storage::sqlite::SqliteRepository;

fn build_user(role: UserRole) -> User {
    let id = UserId::random();
    User::new(
        id,
        "Sam Field",
        format!("sam-{id}@example.test"),
        role,
        None,
        fixed_now(),
    )
    .unwrap()
}

fn build_course(instructor_id: UserId) -> Course {
    Course::new(
        CourseId::random(),
        "Databases",
        "intro to relational modeling",
        "programming",
        CourseLevel::Beginner,
        CourseStatus::Published,
        instructor_id,
        fixed_now(),
    )
    .unwrap()
}

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

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

/// Seeds a user, course, lesson, and enrollment so foreign keys hold.
async fn seed(repo: &SqliteRepository) -> (User, Course, Lesson, Enrollment) {
    let instructor = build_user(UserRole::Instructor);
    repo.upsert_user(&instructor).await.unwrap();
    let student = build_user(UserRole::Student);
    repo.upsert_user(&student).await.unwrap();

    let course = build_course(instructor.id());
    repo.upsert_course(&course).await.unwrap();

    let lesson = build_lesson(course.id(), 1);
    repo.upsert_lesson(&lesson).await.unwrap();

    let enrollment = Enrollment::new(
        EnrollmentId::random(),
        student.id(),
        course.id(),
        fixed_now(),
    );
    repo.insert_enrollment(&enrollment).await.unwrap();

    (student, course, lesson, enrollment)
}

#[tokio::test]
async fn role_column_stores_upper_case_and_round_trips() {
    let repo = connect("memdb_role_case").await;
    let user = build_user(UserRole::Instructor);
    repo.upsert_user(&user).await.unwrap();

    let raw: String = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
        .bind(user.id().to_string())
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(raw, "INSTRUCTOR");

    let fetched = repo.get_user(user.id()).await.unwrap().unwrap();
    assert_eq!(fetched.role(), UserRole::Instructor);
}

#[tokio::test]
async fn status_columns_store_lower_case() {
    let repo = connect("memdb_status_case").await;
    let (_, course, _, enrollment) = seed(&repo).await;

    let raw: String = sqlx::query_scalar("SELECT status FROM courses WHERE id = ?1")
        .bind(course.id().to_string())
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(raw, "published");

    let raw: String = sqlx::query_scalar("SELECT status FROM enrollments WHERE id = ?1")
        .bind(enrollment.id().to_string())
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(raw, "active");
}

#[tokio::test]
async fn mixed_case_rows_still_decode() {
    let repo = connect("memdb_mixed_case").await;
    let (student, _, _, enrollment) = seed(&repo).await;

    // Rows written by other tooling may not follow the case convention.
    sqlx::query("UPDATE users SET role = 'Student' WHERE id = ?1")
        .bind(student.id().to_string())
        .execute(repo.pool())
        .await
        .unwrap();
    sqlx::query("UPDATE enrollments SET status = 'ACTIVE' WHERE id = ?1")
        .bind(enrollment.id().to_string())
        .execute(repo.pool())
        .await
        .unwrap();

    let fetched = repo.get_user(student.id()).await.unwrap().unwrap();
    assert_eq!(fetched.role(), UserRole::Student);

    let fetched = repo.get_enrollment(enrollment.id()).await.unwrap().unwrap();
    assert_eq!(fetched.status(), EnrollmentStatus::Active);
}

#[tokio::test]
async fn unknown_enum_value_is_an_integrity_error() {
    let repo = connect("memdb_bad_enum").await;
    let (student, _, _, _) = seed(&repo).await;

    sqlx::query("UPDATE users SET role = 'wizard' WHERE id = ?1")
        .bind(student.id().to_string())
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.get_user(student.id()).await.unwrap_err();
    match err {
        StorageError::Integrity(unknown) => {
            assert_eq!(unknown.value, "wizard");
        }
        other => panic!("expected integrity error, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_enrollment_insert_is_conflict() {
    let repo = connect("memdb_dup_enrollment").await;
    let (student, course, _, _) = seed(&repo).await;

    let duplicate = Enrollment::new(
        EnrollmentId::random(),
        student.id(),
        course.id(),
        fixed_now(),
    );
    let err = repo.insert_enrollment(&duplicate).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn save_progress_commits_ledger_and_aggregate_together() {
    let repo = connect("memdb_save_progress").await;
    let (_, _, lesson, mut enrollment) = seed(&repo).await;

    let mut record = LessonProgress::new(enrollment.id(), lesson.id());
    record.complete(fixed_now());
    enrollment.apply_progress(1, 1, fixed_now());

    repo.save_progress(&record, &enrollment).await.unwrap();

    let stored = repo
        .get_progress(enrollment.id(), lesson.id())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.completed_at(), Some(fixed_now()));

    let stored_enrollment = repo.get_enrollment(enrollment.id()).await.unwrap().unwrap();
    assert_eq!(stored_enrollment.status(), EnrollmentStatus::Completed);
    assert!((stored_enrollment.progress_percent() - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn repeated_saves_keep_one_row_per_pair() {
    let repo = connect("memdb_one_row").await;
    let (_, _, lesson, mut enrollment) = seed(&repo).await;

    let mut record = LessonProgress::new(enrollment.id(), lesson.id());
    record.complete(fixed_now());
    enrollment.apply_progress(1, 1, fixed_now());

    repo.save_progress(&record, &enrollment).await.unwrap();
    repo.save_progress(&record, &enrollment).await.unwrap();

    let n: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lesson_progress WHERE enrollment_id = ?1 AND lesson_id = ?2",
    )
    .bind(enrollment.id().to_string())
    .bind(lesson.id().to_string())
    .fetch_one(repo.pool())
    .await
    .unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn concurrent_saves_for_same_pair_keep_one_row() {
    let repo = connect("memdb_concurrent").await;
    let (_, _, lesson, mut enrollment) = seed(&repo).await;

    let mut record = LessonProgress::new(enrollment.id(), lesson.id());
    record.complete(fixed_now());
    enrollment.apply_progress(1, 1, fixed_now());

    let (a, b) = tokio::join!(
        repo.save_progress(&record, &enrollment),
        repo.save_progress(&record, &enrollment),
    );
    a.unwrap();
    b.unwrap();

    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson_progress")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn lessons_list_in_position_order_with_stable_ties() {
    let repo = connect("memdb_lesson_order").await;
    let (_, course, _, _) = seed(&repo).await;

    let third = build_lesson(course.id(), 3);
    let second = build_lesson(course.id(), 2);
    repo.upsert_lesson(&third).await.unwrap();
    repo.upsert_lesson(&second).await.unwrap();

    let listed = repo.list_lessons_by_course(course.id()).await.unwrap();
    let positions: Vec<u32> = listed.iter().map(Lesson::position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
}
