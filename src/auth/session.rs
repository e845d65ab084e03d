use std::sync::Arc;

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::StoreError;

pub const SESSION_COOKIE_NAME: &str = "auth_session";
const SESSION_ID_LEN: usize = 40;

/// Server-side session bound to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    /// Set when the expiry was just (re)issued; the client needs a new cookie.
    pub fresh: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

impl From<SessionRow> for Session {
    fn from(r: SessionRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            expires_at: r.expires_at,
            fresh: false,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;
    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError>;
    async fn update_session_expiry(
        &self,
        id: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;
    async fn delete_session(&self, id: &str) -> Result<(), StoreError>;
    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO user_session (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, user_id, expires_at FROM user_session WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn update_session_expiry(
        &self,
        id: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE user_session SET expires_at = $1 WHERE id = $2")
            .bind(expires_at)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_session WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM user_session WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}

/// Issues, validates and revokes sessions, and builds the cookies that carry them.
///
/// Expiry slides: once less than half of the lifetime is left, validation
/// pushes the expiry out to a full lifetime again and marks the session fresh.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, cfg: &SessionConfig) -> Self {
        Self {
            store,
            ttl: Duration::days(cfg.ttl_days),
            secure_cookies: cfg.secure_cookies,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create_session(&self, user_id: Uuid) -> Result<Session, StoreError> {
        let session = Session {
            id: generate_session_id(),
            user_id,
            expires_at: OffsetDateTime::now_utc() + self.ttl,
            fresh: true,
        };
        self.store.insert_session(&session).await?;
        debug!(%user_id, "session created");
        Ok(session)
    }

    /// `Ok(None)` for unknown, malformed or expired tokens.
    pub async fn validate_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.validate_session_at(token, OffsetDateTime::now_utc())
            .await
    }

    pub async fn validate_session_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Session>, StoreError> {
        if !is_well_formed(token) {
            return Ok(None);
        }
        let Some(mut session) = self.store.get_session(token).await? else {
            return Ok(None);
        };
        if now >= session.expires_at {
            self.store.delete_session(&session.id).await?;
            debug!(user_id = %session.user_id, "expired session removed");
            return Ok(None);
        }
        if session.expires_at - now < self.ttl / 2 {
            session.expires_at = now + self.ttl;
            session.fresh = true;
            self.store
                .update_session_expiry(&session.id, session.expires_at)
                .await?;
            debug!(user_id = %session.user_id, "session expiry extended");
        }
        Ok(Some(session))
    }

    pub async fn invalidate_session(&self, token: &str) -> Result<(), StoreError> {
        if !is_well_formed(token) {
            return Ok(());
        }
        self.store.delete_session(token).await
    }

    pub async fn delete_expired_sessions(&self) -> Result<u64, StoreError> {
        self.store
            .delete_expired_sessions(OffsetDateTime::now_utc())
            .await
    }

    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, session.id.clone()))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .expires(session.expires_at)
            .build()
    }

    pub fn blank_session_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(Duration::ZERO)
            .build()
    }
}

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

fn is_well_formed(token: &str) -> bool {
    token.len() == SESSION_ID_LEN && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
