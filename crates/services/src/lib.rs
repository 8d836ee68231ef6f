#![forbid(unsafe_code)]

pub mod enrollment_service;
pub mod error;
pub mod progress_service;
pub mod stats_service;

pub use lms_core::Clock;

pub use error::{EnrollmentError, ProgressError, StatsError};

pub use enrollment_service::{Certificate, EnrollmentService};
pub use progress_service::{EnrollmentSnapshot, ProgressService};
pub use stats_service::{PlatformStats, StatsService};
