use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{
    NewUser, Permission, PermissionRow, User, UserPermissionRow, UserRow, DEFAULT_PERMISSION,
};
use crate::error::StoreError;

const USER_COLUMNS: &str = "u.id, u.first_name, u.last_name, u.email, u.username, u.password, \
     u.is_locked, u.is_verified, u.last_verification_attempt, u.permission_id";

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a user with the default permission.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_with_permission(&self, id: Uuid)
        -> Result<Option<(User, Permission)>, StoreError>;
    async fn find_permission(&self, id: Uuid) -> Result<Option<Permission>, StoreError>;
    /// Marks the email as verified. Returns false when no such user exists.
    async fn verify_user(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn set_verification_attempt(
        &self,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one_by(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM user_account u WHERE u.{column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO user_account (first_name, last_name, email, username, password, permission_id)
            SELECT $1, $2, $3, $4, $5, p.id
            FROM permission p
            WHERE p.name = $6
            RETURNING id, first_name, last_name, email, username, password,
                      is_locked, is_verified, last_verification_attempt, permission_id
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(DEFAULT_PERMISSION)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM user_account u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_one_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one_by("email", email).await
    }

    async fn find_with_permission(
        &self,
        id: Uuid,
    ) -> Result<Option<(User, Permission)>, StoreError> {
        let row = sqlx::query_as::<_, UserPermissionRow>(&format!(
            r#"
            SELECT {USER_COLUMNS},
                   p.name AS permission_name,
                   p.description AS permission_description
            FROM user_account u
            JOIN permission p ON p.id = u.permission_id
            WHERE u.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_permission(&self, id: Uuid) -> Result<Option<Permission>, StoreError> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT p.id, p.name, p.description
            FROM permission p
            JOIN user_account u ON u.permission_id = p.id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Permission::from))
    }

    async fn verify_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE user_account SET is_verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_verification_attempt(
        &self,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let res =
            sqlx::query("UPDATE user_account SET last_verification_attempt = $1 WHERE id = $2")
                .bind(at)
                .bind(id)
                .execute(&self.db)
                .await?;
        Ok(res.rows_affected() > 0)
    }
}
