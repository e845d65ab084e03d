use anyhow::Context;
use serde::Deserialize;

/// Minimum length of `COOKIE_SECRET`; the signing key is built directly from these bytes.
pub const MIN_COOKIE_SECRET_LEN: usize = 64;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
pub const MAX_SESSION_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_secret: String,
    pub ttl_days: i64,
    /// Sets the `Secure` cookie attribute.
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL of the web client; emailed links point at its pages.
    pub client_url: String,
    /// Username of the account owning the default labels.
    pub default_label_owner: String,
    pub session: SessionConfig,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };

        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let cookie_secret = required("COOKIE_SECRET")?;
        anyhow::ensure!(
            cookie_secret.len() >= MIN_COOKIE_SECRET_LEN,
            "COOKIE_SECRET must be at least {MIN_COOKIE_SECRET_LEN} bytes long"
        );

        let session = SessionConfig {
            cookie_secret,
            ttl_days: session_ttl_days(std::env::var("SESSION_TTL_DAYS").ok().as_deref())?,
            secure_cookies: app_env == "production",
        };

        let smtp = SmtpConfig {
            host: required("EMAIL_HOST")?,
            port: std::env::var("EMAIL_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(465),
            username: required("EMAIL_USERNAME")?,
            password: required("EMAIL_PASSWORD")?,
            from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "\"Spendthrift Admin\" <admin@saha.nexus>".into()),
        };

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            client_url: std::env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            default_label_owner: std::env::var("DEFAULT_LABEL_OWNER")
                .unwrap_or_else(|_| "superuser".into()),
            session,
            smtp,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| {
        format!("missing environment variable '{key}'; add it to the environment or the .env file")
    })
}

fn database_url_from_parts() -> anyhow::Result<String> {
    let host = required("PG_HOST")?;
    let user = required("PG_USER")?;
    let pass = required("PG_PASS")?;
    let database = required("PG_DATABASE")?;
    let port = std::env::var("PG_PORT").unwrap_or_else(|_| "5432".into());
    Ok(format!("postgres://{user}:{pass}@{host}:{port}/{database}"))
}

/// Unset means the default; anything else must be a whole number of days in `1..=365`.
fn session_ttl_days(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SESSION_TTL_DAYS);
    };
    let days = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("SESSION_TTL_DAYS must be a number of days, got '{raw}'"))?;
    anyhow::ensure!(
        (1..=MAX_SESSION_TTL_DAYS).contains(&days),
        "SESSION_TTL_DAYS must be between 1 and {MAX_SESSION_TTL_DAYS}, got {days}"
    );
    Ok(days)
}
