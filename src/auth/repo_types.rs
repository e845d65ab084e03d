use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const SUPERUSER_PERMISSION: &str = "superuser";
pub const DEFAULT_PERMISSION: &str = "normie";

/// `user_account` row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub is_locked: bool,
    pub is_verified: bool,
    pub last_verification_attempt: Option<OffsetDateTime>,
    pub permission_id: Uuid,
}

/// `user_account` joined with its `permission`.
#[derive(Debug, Clone, FromRow)]
pub struct UserPermissionRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub permission_name: String,
    pub permission_description: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PermissionRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    /// Administrative lock on the account.
    pub is_locked: bool,
    pub is_verified: bool,
    /// Last time a verification email went out; throttles resends.
    pub last_verification_attempt: Option<OffsetDateTime>,
    pub permission_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

impl Permission {
    pub fn is_superuser(&self) -> bool {
        self.name == SUPERUSER_PERMISSION
    }
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            username: r.username,
            password_hash: r.password,
            is_locked: r.is_locked,
            is_verified: r.is_verified,
            last_verification_attempt: r.last_verification_attempt,
            permission_id: r.permission_id,
        }
    }
}

impl From<PermissionRow> for Permission {
    fn from(r: PermissionRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
        }
    }
}

impl From<UserPermissionRow> for (User, Permission) {
    fn from(r: UserPermissionRow) -> Self {
        let permission = Permission {
            id: r.user.permission_id,
            name: r.permission_name,
            description: r.permission_description,
        };
        (r.user.into(), permission)
    }
}
