use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{PublicUser, SigninRequest, SignupRequest},
        gate::{resolve_target, Identity},
        password::{hash_password, verify_dummy_password, verify_password},
        repo_types::{NewUser, Permission},
        services::{send_verification, validate_signup, verification_cooldown_remaining},
    },
    error::{ApiError, DataBody, MessageBody},
    state::AppState,
    validation::{is_valid_password, is_valid_username},
};

/// Routes reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// Routes that must sit behind the session gate.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/signout", post(signout))
        .route("/me", get(get_me))
        .route("/verifyEmail", post(verify_email))
        .route("/verifyEmail/:user_id", post(verify_email))
        .route("/resendVerificationEmail", post(resend_verification_email))
        .route("/resendVerificationEmail/:user_id", post(resend_verification_email))
        .route("/permissions", get(get_permissions))
        .route("/permissions/:user_id", get(get_permissions))
}

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(SignedCookieJar, Json<MessageBody>), ApiError> {
    let signup = validate_signup(payload).map_err(|e| {
        warn!(error = %e, "signup rejected");
        e
    })?;

    if state.users.find_by_username(&signup.username).await?.is_some() {
        warn!(username = %signup.username, "username already registered");
        return Err(ApiError::Conflict("Username already exists".into()));
    }
    if state.users.find_by_email(&signup.email).await?.is_some() {
        warn!(email = %signup.email, "email already registered");
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let password_hash = hash_password(&signup.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal("Unable to create user".into())
    })?;

    let user = state
        .users
        .create_user(NewUser {
            first_name: signup.first_name,
            last_name: signup.last_name,
            email: signup.email,
            username: signup.username,
            password_hash,
        })
        .await?;

    let session = state.sessions.create_session(user.id).await?;

    if let Err(e) = send_verification(&state, &user).await {
        error!(error = %e, user_id = %user.id, "verification email failed during signup");
    }

    info!(user_id = %user.id, username = %user.username, "user signed up");
    Ok((
        jar.add(state.sessions.session_cookie(&session)),
        MessageBody::new("Sign-up successful"),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn signin(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(payload): Json<SigninRequest>,
) -> Result<(SignedCookieJar, Json<MessageBody>), ApiError> {
    let username = payload
        .username
        .filter(|v| is_valid_username(v))
        .ok_or_else(|| ApiError::Validation("Illegal username".into()))?;
    let password = payload
        .password
        .filter(|v| is_valid_password(v))
        .ok_or_else(|| ApiError::Validation("Illegal password".into()))?;

    let Some(user) = state.users.find_by_username(&username).await? else {
        warn!(%username, "signin unknown username");
        verify_dummy_password(&password);
        return Err(ApiError::Validation(INVALID_CREDENTIALS.into()));
    };

    let ok = verify_password(&password, &user.password_hash).unwrap_or_else(|e| {
        error!(error = %e, user_id = %user.id, "stored password hash unusable");
        false
    });
    if !ok {
        warn!(user_id = %user.id, "signin invalid password");
        return Err(ApiError::Validation(INVALID_CREDENTIALS.into()));
    }

    let session = state.sessions.create_session(user.id).await?;
    info!(user_id = %user.id, "user signed in");
    Ok((
        jar.add(state.sessions.session_cookie(&session)),
        MessageBody::new("Sign-in successful"),
    ))
}

#[instrument(skip(state, jar, identity), fields(user_id = %identity.user_id))]
pub async fn signout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    identity: Identity,
) -> Result<(SignedCookieJar, Json<MessageBody>), ApiError> {
    state.sessions.invalidate_session(&identity.session_id).await?;
    info!("user signed out");
    Ok((
        jar.remove(state.sessions.blank_session_cookie()),
        MessageBody::new("Sign-out successful"),
    ))
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<DataBody<PublicUser>>, ApiError> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Unable to load the logged in user".into()))?;
    Ok(DataBody::new(PublicUser::new(user, identity.is_superuser)))
}

#[instrument(skip(state, identity), fields(caller = %identity.user_id))]
pub async fn verify_email(
    State(state): State<AppState>,
    identity: Identity,
    user_id: Option<Path<String>>,
) -> Result<Json<MessageBody>, ApiError> {
    let target = resolve_target(&identity, user_id.as_deref().map(String::as_str))?;

    if !state.users.verify_user(target).await? {
        warn!(%target, "verify email for unknown user");
        return Err(ApiError::NotFound("Unable to verify email".into()));
    }
    info!(%target, "email verified");
    Ok(MessageBody::new("User's email was successfully verified"))
}

#[instrument(skip(state, identity), fields(caller = %identity.user_id))]
pub async fn resend_verification_email(
    State(state): State<AppState>,
    identity: Identity,
    user_id: Option<Path<String>>,
) -> Result<Json<MessageBody>, ApiError> {
    let target = resolve_target(&identity, user_id.as_deref().map(String::as_str))?;

    let user = state
        .users
        .find_by_id(target)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unable to send verification email".into()))?;

    if user.is_verified {
        return Err(ApiError::Forbidden("You are already verified".into()));
    }
    if let Some(remaining) =
        verification_cooldown_remaining(user.last_verification_attempt, OffsetDateTime::now_utc())
    {
        let secs = remaining.as_seconds_f64().ceil() as i64;
        return Err(ApiError::Forbidden(format!(
            "You cannot send another email verification for another {secs}s"
        )));
    }

    send_verification(&state, &user).await.map_err(|e| {
        error!(error = %e, user_id = %user.id, "resend verification failed");
        ApiError::Internal("Unable to send verification email".into())
    })?;
    Ok(MessageBody::new("Sent verification email"))
}

#[instrument(skip(state, identity), fields(caller = %identity.user_id))]
pub async fn get_permissions(
    State(state): State<AppState>,
    identity: Identity,
    user_id: Option<Path<String>>,
) -> Result<Json<DataBody<Permission>>, ApiError> {
    let target = resolve_target(&identity, user_id.as_deref().map(String::as_str))?;
    let permission = state
        .users
        .find_permission(target)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unable to get permissions for user".into()))?;
    Ok(DataBody::new(permission))
}
