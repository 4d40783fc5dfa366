use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{
        AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, PublicUser,
        RefreshRequest, RegisterRequest, ResetPasswordRequest, ResetPasswordResponse,
    },
    extractors::AuthUser,
    jwt::JwtKeys,
    password::{hash_password, is_strong_enough, verify_password, MIN_PASSWORD_LEN},
    repo_types::User,
    reset::{self, reset_link},
    services::{is_valid_email, issue_tokens, normalize_email, normalize_name},
};
use crate::{
    error::{bad_request, internal, is_unique_violation, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn invalid_credentials() -> ApiError {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
}

fn weak_password() -> ApiError {
    bad_request(format!("Password must be at least {MIN_PASSWORD_LEN} characters"))
}

fn forgot_response(link: Option<String>) -> ForgotPasswordResponse {
    let message = match link {
        Some(_) => "Ссылка для сброса пароля создана. Используйте её в течение 1 часа.",
        None => "Если аккаунт с таким email существует, на него придёт ссылка для сброса пароля.",
    };
    ForgotPasswordResponse {
        success: true,
        message: message.into(),
        reset_link: link,
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(bad_request("Invalid email"));
    }
    if !is_strong_enough(&payload.password) {
        return Err(weak_password());
    }

    if User::find_by_email(&state.db, &email)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(%email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let name = normalize_name(payload.name.as_deref());
    let user = match User::create(&state.db, &email, &hash, name.as_deref()).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err((StatusCode::CONFLICT, "Email already registered".into()))
        }
        Err(e) => return Err(internal(e)),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    let body = issue_tokens(&keys, user).map_err(internal)?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(bad_request("Invalid email"));
    }

    let user = User::find_by_email(&state.db, &email)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            warn!(%email, "login unknown email");
            invalid_credentials()
        })?;

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user).map_err(internal)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&keys, user).map_err(internal)?))
}

#[instrument(skip(state, headers, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(bad_request("Invalid email"));
    }

    let token = reset::request_reset(&state.db, &email, OffsetDateTime::now_utc())
        .await
        .map_err(internal)?;
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    Ok(Json(forgot_response(token.map(|t| reset_link(origin, &t)))))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, ApiError> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(bad_request("token is required"));
    }
    if !is_strong_enough(&payload.password) {
        return Err(weak_password());
    }

    reset::reset_password(&state.db, token, &payload.password, OffsetDateTime::now_utc()).await?;
    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Пароль успешно изменён. Войдите с новым паролем.".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    Ok(Json(PublicUser::from(user)))
}
