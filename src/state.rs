use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::PgPool;

use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::auth::session::{PgSessionStore, SessionManager};
use crate::config::AppConfig;
use crate::labels::repo::{LabelRepo, PgLabelRepo};
use crate::mail::{Mailer, SmtpMailer};
use crate::purchases::repo::{PgPurchaseRepo, PurchaseRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
    pub users: Arc<dyn UserRepo>,
    pub labels: Arc<dyn LabelRepo>,
    pub purchases: Arc<dyn PurchaseRepo>,
    pub mailer: Arc<dyn Mailer>,
    pub cookie_key: Key,
}

impl AppState {
    /// PostgreSQL-backed stores and the SMTP mailer.
    pub fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?) as Arc<dyn Mailer>;
        let sessions = SessionManager::new(
            Arc::new(PgSessionStore::new(db.clone())),
            &config.session,
        );
        Ok(Self::from_parts(
            config.clone(),
            sessions,
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgLabelRepo::new(db.clone(), config.default_label_owner)),
            Arc::new(PgPurchaseRepo::new(db)),
            mailer,
        ))
    }

    pub fn from_parts(
        config: AppConfig,
        sessions: SessionManager,
        users: Arc<dyn UserRepo>,
        labels: Arc<dyn LabelRepo>,
        purchases: Arc<dyn PurchaseRepo>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        // Length is checked in AppConfig::from_env; Key::from panics below 64 bytes.
        let cookie_key = Key::from(config.session.cookie_secret.as_bytes());
        Self {
            config: Arc::new(config),
            sessions,
            users,
            labels,
            purchases,
            mailer,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
