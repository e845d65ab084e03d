use time::{Duration, OffsetDateTime};
use tracing::{error, info};

use crate::auth::{dto::SignupRequest, repo_types::User};
use crate::error::ApiError;
use crate::mail::verification_email;
use crate::state::AppState;
use crate::validation::{
    is_valid_email, is_valid_first_name, is_valid_last_name, is_valid_password, is_valid_username,
};

/// Minimum spacing between two verification emails to the same user.
pub const VERIFICATION_COOLDOWN: Duration = Duration::seconds(300);

/// Sign-up fields that passed format checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Format checks in a fixed order; the first failure wins.
pub fn validate_signup(req: SignupRequest) -> Result<ValidSignup, ApiError> {
    fn bad(msg: &str) -> ApiError {
        ApiError::Validation(msg.to_string())
    }

    let first_name = req
        .first_name
        .filter(|v| is_valid_first_name(v))
        .ok_or_else(|| bad("Illegal first name"))?;
    let last_name = req
        .last_name
        .filter(|v| is_valid_last_name(v))
        .ok_or_else(|| bad("Illegal last name"))?;
    let username = req
        .username
        .filter(|v| is_valid_username(v))
        .ok_or_else(|| bad("Illegal username"))?;
    let password = req
        .password
        .filter(|v| is_valid_password(v))
        .ok_or_else(|| bad("Illegal password"))?;
    if req.password_confirm.as_deref() != Some(password.as_str()) {
        return Err(bad("Passwords didn't match"));
    }
    let email = req
        .email
        .map(|v| v.trim().to_lowercase())
        .filter(|v| is_valid_email(v))
        .ok_or_else(|| bad("Illegal email"))?;
    let email_confirm = req.email_confirm.map(|v| v.trim().to_lowercase());
    if email_confirm.as_deref() != Some(email.as_str()) {
        return Err(bad("Emails didn't match"));
    }

    Ok(ValidSignup {
        first_name,
        last_name,
        username,
        password,
        email,
    })
}

/// Time left before another verification email may be sent, if any.
pub fn verification_cooldown_remaining(
    last_attempt: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Option<Duration> {
    let elapsed = now - last_attempt?;
    (elapsed < VERIFICATION_COOLDOWN).then(|| VERIFICATION_COOLDOWN - elapsed)
}

/// Sends the verification email and stamps the attempt time.
pub async fn send_verification(state: &AppState, user: &User) -> anyhow::Result<()> {
    let email = verification_email(&state.config.client_url, &user.first_name, user.id);
    state
        .mailer
        .send_email(&user.email, &email.subject, &email.body)
        .await?;
    if let Err(e) = state
        .users
        .set_verification_attempt(user.id, OffsetDateTime::now_utc())
        .await
    {
        error!(error = %e, user_id = %user.id, "failed to record verification attempt");
    }
    info!(user_id = %user.id, "verification email sent");
    Ok(())
}
