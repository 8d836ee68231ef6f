use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::{PersistedEnum, StoredCase};
use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("full name cannot be empty")]
    EmptyName,

    #[error("email address is not valid")]
    InvalidEmail,
}

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

/// Role a user acts under across the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

// The users table predates the rest of the schema and stores roles
// upper-case; every other enum column is lower-case.
impl PersistedEnum for UserRole {
    const NAME: &'static str = "user role";
    const STORED_CASE: StoredCase = StoredCase::Upper;
    const VARIANTS: &'static [Self] = &[UserRole::Student, UserRole::Instructor, UserRole::Admin];

    fn tag(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
        }
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A registered account: student, instructor, or admin.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    full_name: String,
    email: String,
    role: UserRole,
    bio: Option<String>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyName` if the name is empty or whitespace-only,
    /// `UserError::InvalidEmail` if the email has no `@`.
    pub fn new(
        id: UserId,
        full_name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
        bio: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let full_name = full_name.into();
        if full_name.trim().is_empty() {
            return Err(UserError::EmptyName);
        }

        let email = email.into().trim().to_owned();
        if !email.contains('@') {
            return Err(UserError::InvalidEmail);
        }

        let bio = bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());

        Ok(Self {
            id,
            full_name: full_name.trim().to_owned(),
            email,
            role,
            bio,
            created_at,
        })
    }

    /// Rebuilds a user from storage, applying the same validation as `new`.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the persisted fields fail validation.
    pub fn from_persisted(
        id: UserId,
        full_name: String,
        email: String,
        role: UserRole,
        bio: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::new(id, full_name, email, role, bio, created_at)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    #[must_use]
    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{decode, encode};
    use crate::time::fixed_now;

    #[test]
    fn role_round_trips_through_storage_form() {
        for &role in UserRole::VARIANTS {
            assert_eq!(decode::<UserRole>(&encode(role)).unwrap(), role);
        }
    }

    #[test]
    fn role_encodes_upper_case() {
        assert_eq!(encode(UserRole::Student), "STUDENT");
        assert_eq!(encode(UserRole::Instructor), "INSTRUCTOR");
        assert_eq!(encode(UserRole::Admin), "ADMIN");
    }

    #[test]
    fn role_decodes_any_case() {
        assert_eq!(decode::<UserRole>("admin").unwrap(), UserRole::Admin);
        assert_eq!(decode::<UserRole>("Admin").unwrap(), UserRole::Admin);
        assert_eq!(decode::<UserRole>("ADMIN").unwrap(), UserRole::Admin);
    }

    #[test]
    fn role_rejects_unknown_value() {
        let err = decode::<UserRole>("superuser").unwrap_err();
        assert_eq!(err.enumeration, "user role");
    }

    #[test]
    fn user_new_rejects_empty_name() {
        let err = User::new(
            UserId::random(),
            "  ",
            "a@b.test",
            UserRole::Student,
            None,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, UserError::EmptyName);
    }

    #[test]
    fn user_new_rejects_bad_email() {
        let err = User::new(
            UserId::random(),
            "Dana",
            "not-an-email",
            UserRole::Student,
            None,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, UserError::InvalidEmail);
    }

    #[test]
    fn user_trims_name_and_filters_empty_bio() {
        let user = User::new(
            UserId::random(),
            "  Dana Reyes  ",
            "dana@example.test",
            UserRole::Instructor,
            Some("   ".into()),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(user.full_name(), "Dana Reyes");
        assert_eq!(user.bio(), None);
    }
}
