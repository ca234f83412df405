use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    config::AppConfig,
    dto::auth::{Claims, RegisterRequest},
    error::{AppError, AppResult},
    models::User,
    state::AppState,
    store::{NewUser, StoreError, UserPatch},
};

const TOKEN_TTL_HOURS: i64 = 24;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Resolve an email/password pair to its user.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let credentials = state
        .store
        .find_credentials_by_email(email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&credentials.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::debug!("login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let user = credentials.user;
    log_audit(
        state.store.as_ref(),
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;
    Ok(user)
}

pub fn issue_token(config: &AppConfig, user: &User) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        admin: user.is_admin,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<User> {
    let RegisterRequest {
        name,
        email,
        password,
        phone,
    } = payload;
    let email = email.trim().to_string();

    if state.store.email_exists(&email).await? {
        return Err(AppError::EmailAlreadyExists);
    }

    let new_user = NewUser {
        name: name.trim().to_string(),
        email,
        password_hash: hash_password(&password)?,
        phone: phone.filter(|p| !p.trim().is_empty()),
        is_admin: false,
    };

    let user = match state.store.insert_user(new_user).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Err(AppError::EmailAlreadyExists),
        Err(err) => return Err(err.into()),
    };

    tracing::info!(user_id = %user.id, "user registered");
    log_audit(
        state.store.as_ref(),
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;
    Ok(user)
}

/// Apply a partial profile update and return the stored result.
///
/// Fields are trimmed and blank ones are ignored, as at registration.
pub async fn update_profile(state: &AppState, user_id: Uuid, patch: UserPatch) -> AppResult<User> {
    match state.store.update_user(user_id, patch.normalized()).await {
        Ok(Some(user)) => {
            log_audit(
                state.store.as_ref(),
                Some(user_id),
                "profile_update",
                Some("users"),
                None,
            )
            .await;
            Ok(user)
        }
        Ok(None) => {
            tracing::warn!(%user_id, "profile update for unknown user");
            Err(AppError::UpdateFailed)
        }
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "profile update failed");
            Err(AppError::UpdateFailed)
        }
    }
}

/// Never fails: lookup errors are logged and reported as absence.
pub async fn get_user_by_id(state: &AppState, user_id: Uuid) -> Option<User> {
    match state.store.find_user_by_id(user_id).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "user lookup failed");
            None
        }
    }
}
