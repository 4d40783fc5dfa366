//! Password reset through a one-time link.
//!
//! The link is returned to the caller instead of being mailed. A token lives
//! for an hour, a newer request replaces older ones, and redeeming a token
//! deletes it.

use anyhow::Context;
use axum::http::StatusCode;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::password::hash_password;
use super::repo_types::{ResetRequest, User};
use crate::error::{internal, ApiError};

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);
const RESET_TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("Ссылка недействительна или истекла. Запросите сброс пароля заново.")]
    InvalidToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ResetError> for ApiError {
    fn from(e: ResetError) -> Self {
        match e {
            ResetError::InvalidToken => (StatusCode::BAD_REQUEST, e.to_string()),
            ResetError::Internal(e) => internal(e),
        }
    }
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// `origin` is the caller's `Origin` header; without one the link is relative.
pub fn reset_link(origin: Option<&str>, token: &str) -> String {
    let base = origin.map(|o| o.trim().trim_end_matches('/')).unwrap_or("");
    format!("{base}/reset-password?token={token}")
}

/// New token for `email`, or `None` when no such user exists.
pub async fn request_reset(
    db: &PgPool,
    email: &str,
    now: OffsetDateTime,
) -> anyhow::Result<Option<String>> {
    let Some(user) = User::find_by_email(db, email).await? else {
        return Ok(None);
    };

    let token = generate_token();
    let mut conn = db.acquire().await.context("acquire connection")?;
    ResetRequest::replace_for(&mut conn, user.id, &token, now + RESET_TOKEN_TTL).await?;
    info!(user_id = %user.id, "password reset requested");
    Ok(Some(token))
}

/// Redeems `token` and stores the new password; returns the user id.
pub async fn reset_password(
    db: &PgPool,
    token: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> Result<Uuid, ResetError> {
    let mut tx = db.begin().await.context("begin transaction")?;
    let request = ResetRequest::take(&mut tx, token)
        .await?
        .ok_or(ResetError::InvalidToken)?;
    if request.is_expired(now) {
        // the expired row stays deleted
        tx.commit().await.context("commit expired reset")?;
        warn!(user_id = %request.user_id, "expired reset token used");
        return Err(ResetError::InvalidToken);
    }

    let hash = hash_password(new_password)?;
    if !User::set_password_hash(&mut tx, request.user_id, &hash).await? {
        return Err(ResetError::InvalidToken);
    }
    tx.commit().await.context("commit password reset")?;
    info!(user_id = %request.user_id, "password reset");
    Ok(request.user_id)
}
