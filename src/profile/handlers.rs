use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::{ProfileView, UpdateProfileRequest, UpdateProfileResponse};
use super::repo::{self, ProfileChanges};
use crate::{
    auth::AuthUser,
    error::{bad_request, internal, not_found, ApiError},
    meals::parse_date,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).patch(update_profile))
}

fn in_range<T: PartialOrd + Copy>(
    field: &str,
    v: Option<T>,
    min: T,
    max: T,
) -> Result<Option<T>, ApiError> {
    match v {
        Some(x) if !(min..=max).contains(&x) => Err(bad_request(format!("{field} is out of range"))),
        other => Ok(other),
    }
}

/// Validates a patch body; untouched fields stay `None`.
fn changes_from(req: UpdateProfileRequest) -> Result<ProfileChanges, ApiError> {
    let birth_date = match req.birth_date {
        None => None,
        Some(None) => Some(None),
        Some(Some(raw)) if raw.trim().is_empty() => Some(None),
        Some(Some(raw)) => Some(Some(
            parse_date(&raw).ok_or_else(|| bad_request("birthDate must be YYYY-MM-DD"))?,
        )),
    };
    Ok(ProfileChanges {
        name: req
            .name
            .map(|n| Some(n.trim().to_string()).filter(|n| !n.is_empty())),
        height: req
            .height
            .map(|h| in_range("height", h, 50, 250))
            .transpose()?,
        weight: req
            .weight
            .map(|w| in_range("weight", w, 20.0, 300.0))
            .transpose()?,
        birth_date,
        calorie_deficit: req
            .calorie_deficit
            .map(|d| in_range("calorieDeficit", d, 0, 2000))
            .transpose()?,
    })
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileView>, ApiError> {
    let row = repo::find(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("User not found"))?;
    Ok(Json(ProfileView::new(row, OffsetDateTime::now_utc().date())))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let changes = changes_from(body)?;
    let row = repo::update(&state.db, user_id, changes)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("User not found"))?;
    info!(%user_id, "profile updated");
    Ok(Json(UpdateProfileResponse {
        success: true,
        user: ProfileView::new(row, OffsetDateTime::now_utc().date()),
    }))
}
