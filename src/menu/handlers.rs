use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    CreateMenuItemRequest, MenuItemResponse, MenuPage, MenuQuery, PageInfo, UpdateMenuItemRequest,
    MAX_NAME_LEN,
};
use super::repo;
use crate::{
    auth::AuthUser,
    error::{internal, is_unique_violation, not_found, require_name, require_non_negative, ApiError},
    nutrition::NutrientProfile,
    state::AppState,
};

pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/menu", get(list_menu).post(create_menu_item))
        .route("/menu/:id", patch(update_menu_item).delete(delete_menu_item))
}

fn validate_name(raw: &str) -> Result<String, ApiError> {
    require_name(raw, MAX_NAME_LEN)
}

#[instrument(skip(state))]
pub async fn list_menu(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<MenuQuery>,
) -> Result<Json<MenuPage>, ApiError> {
    let page = q.page();
    let limit = q.limit();
    let offset = q.offset();

    let (items, total) = match q.search() {
        Some(needle) => {
            let all = repo::list_all(&state.db, user_id).await.map_err(internal)?;
            let filtered: Vec<_> = all
                .into_iter()
                .filter(|i| i.name.to_lowercase().contains(&needle))
                .collect();
            let total = filtered.len() as i64;
            let items = filtered
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            (items, total)
        }
        None => repo::list_page(&state.db, user_id, limit, offset)
            .await
            .map_err(internal)?,
    };

    Ok(Json(MenuPage {
        items,
        pagination: PageInfo::new(page, limit, total),
    }))
}

#[instrument(skip(state, body))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let name = validate_name(&body.name)?;
    let profile = NutrientProfile::new(
        require_non_negative("carbsPer100g", body.carbs_per_100g)?,
        require_non_negative("proteinPer100g", body.protein_per_100g.unwrap_or(0.0))?,
        require_non_negative("fatPer100g", body.fat_per_100g.unwrap_or(0.0))?,
    );

    let item = repo::upsert(&state.db, user_id, &name, &profile)
        .await
        .map_err(internal)?;
    info!(%user_id, item_id = %item.id, name = %item.name, "menu item saved");
    Ok(Json(MenuItemResponse { item }))
}

#[instrument(skip(state, body))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let existing = repo::find(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("MenuItem not found"))?;

    let name = match body.name.as_deref() {
        Some(n) => validate_name(n)?,
        None => existing.name.clone(),
    };
    let current = existing.profile();
    let profile = NutrientProfile::new(
        require_non_negative("carbsPer100g", body.carbs_per_100g.unwrap_or(current.carbs_per_100g))?,
        require_non_negative(
            "proteinPer100g",
            body.protein_per_100g.unwrap_or(current.protein_per_100g),
        )?,
        require_non_negative("fatPer100g", body.fat_per_100g.unwrap_or(current.fat_per_100g))?,
    );

    let item = match repo::update(&state.db, user_id, id, &name, &profile).await {
        Ok(Some(item)) => item,
        Ok(None) => return Err(not_found("MenuItem not found")),
        Err(e) if is_unique_violation(&e) => {
            return Err((StatusCode::CONFLICT, "Menu item with this name already exists".into()))
        }
        Err(e) => return Err(internal(e)),
    };
    Ok(Json(MenuItemResponse { item }))
}

#[instrument(skip(state))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repo::delete(&state.db, user_id, id).await.map_err(internal)?;
    if !deleted {
        return Err(not_found("MenuItem not found"));
    }
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_names_are_bounded_by_max_len() {
        assert!(validate_name(&"я".repeat(MAX_NAME_LEN)).is_ok());
        assert_eq!(
            validate_name(&"я".repeat(MAX_NAME_LEN + 1)).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
    }
}
