use sqlx::Row;

use lms_core::enums::encode;
use lms_core::model::{User, UserId, UserRole};

use super::{SqliteRepository, mapping::map_user_row, mapping::ser};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (id, full_name, email, role, bio, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                full_name = excluded.full_name,
                email = excluded.email,
                role = excluded.role,
                bio = excluded.bio
            ",
        )
        .bind(user.id().to_string())
        .bind(user.full_name().to_owned())
        .bind(user.email().to_owned())
        .bind(encode(user.role()))
        .bind(user.bio().map(str::to_owned))
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, full_name, email, role, bio, created_at
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE role = ?1")
            .bind(encode(role))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let n: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }
}
