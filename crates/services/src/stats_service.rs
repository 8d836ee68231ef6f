use std::sync::Arc;

use serde::Serialize;

use lms_core::model::{PlatformSettings, UserRole};
use storage::repository::{CourseRepository, EnrollmentRepository, UserRepository};

use crate::error::StatsError;

/// Public platform statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStats {
    pub total_students: u64,
    pub total_instructors: u64,
    pub total_courses: u64,
    pub satisfaction_rate: f64,
}

/// Computes display statistics over the whole platform.
pub struct StatsService {
    settings: PlatformSettings,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        settings: PlatformSettings,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            settings,
            users,
            courses,
            enrollments,
        }
    }

    /// Snapshot of headline numbers for the public landing page.
    ///
    /// Satisfaction is the share of enrollments that reached completion,
    /// rounded to one decimal. With no enrollments at all it reports the
    /// configured fallback rate instead of 0, so an empty platform does
    /// not advertise total dissatisfaction.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn platform_stats(&self) -> Result<PlatformStats, StatsError> {
        let total_students = self.users.count_users_by_role(UserRole::Student).await?;
        let total_instructors = self
            .users
            .count_users_by_role(UserRole::Instructor)
            .await?;
        let total_courses = self.courses.count_courses().await?;

        let counts = self.enrollments.count_enrollments().await?;
        let satisfaction_rate = if counts.total == 0 {
            self.settings.fallback_satisfaction_rate()
        } else {
            // Enrollment counts stay far below the point where f64 loses
            // integer precision.
            #[allow(clippy::cast_precision_loss)]
            let raw = counts.completed as f64 / counts.total as f64 * 100.0;
            (raw * 10.0).round() / 10.0
        };

        Ok(PlatformStats {
            total_students,
            total_instructors,
            total_courses,
            satisfaction_rate,
        })
    }
}
