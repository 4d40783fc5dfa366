use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::analysis::{analyze_meal, MealAnalysis};
use super::dto::{
    parse_date, CreateFoodRequest, CreateMealRequest, DayQuery, DeletedResponse,
    FoodItemResponse, MealResponse, UpdateFoodRequest, UpdateMealRequest,
};
use super::naming::normalize_time;
use super::repo;
use super::repo_types::FoodItem;
use super::services::{self, DayView, FoodPatch, NewFood};
use crate::{
    auth::AuthUser,
    error::{bad_request, internal, not_found, require_name, require_non_negative, ApiError},
    nutrition::NutrientProfile,
    state::AppState,
};

const MAX_FOOD_NAME_LEN: usize = 500;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_day))
        .route("/meals/:id", get(get_meal))
        .route("/meals/:id/analyze", get(analyze))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .route("/meals/:id", patch(update_meal).delete(delete_meal))
        .route("/meals/:id/foods", post(add_food))
        .route(
            "/meals/:id/foods/:food_id",
            patch(update_food).delete(delete_food),
        )
}

fn optional_amount(field: &str, v: Option<f64>) -> Result<Option<f64>, ApiError> {
    v.map(|v| require_non_negative(field, v)).transpose()
}

#[instrument(skip(state))]
pub async fn list_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<DayView>, ApiError> {
    let raw = q
        .date
        .ok_or_else(|| bad_request("Date parameter is required"))?;
    let date = parse_date(&raw).ok_or_else(|| bad_request("invalid date"))?;
    let day = services::load_day(&state.db, user_id, date).await?;
    Ok(Json(day))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealResponse>, ApiError> {
    let meal = services::load_meal(&state.db, user_id, id).await?;
    Ok(Json(MealResponse { meal }))
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealResponse>), ApiError> {
    let date = parse_date(&body.date).ok_or_else(|| bad_request("invalid date"))?;
    let time = normalize_time(&body.time).ok_or_else(|| bad_request("time must be HH:MM"))?;

    let created =
        services::create_meal(&state.db, user_id, date, &time, body.notes.as_deref()).await?;
    let meal = services::load_meal(&state.db, user_id, created.id).await?;
    Ok((StatusCode::CREATED, Json(MealResponse { meal })))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealRequest>,
) -> Result<Json<MealResponse>, ApiError> {
    let time = body
        .time
        .as_deref()
        .map(|t| normalize_time(t).ok_or_else(|| bad_request("time must be HH:MM")))
        .transpose()?;

    repo::update_meal(&state.db, user_id, id, time.as_deref(), body.notes())
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Meal not found"))?;
    let meal = services::load_meal(&state.db, user_id, id).await?;
    Ok(Json(MealResponse { meal }))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repo::delete_meal(&state.db, user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found("Meal not found"));
    }
    info!(%user_id, meal_id = %id, "meal deleted");
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealAnalysis>, ApiError> {
    let meal = services::load_meal(&state.db, user_id, id).await?;
    let names: Vec<&str> = meal.food_items.iter().map(|f| f.name.as_str()).collect();
    Ok(Json(analyze_meal(&meal.totals, &names)))
}

#[instrument(skip(state, body))]
pub async fn add_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(meal_id): Path<Uuid>,
    Json(body): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodItemResponse>), ApiError> {
    let food = NewFood {
        name: require_name(&body.name, MAX_FOOD_NAME_LEN)?,
        profile: NutrientProfile::new(
            require_non_negative("carbsPer100g", body.carbs_per_100g)?,
            require_non_negative("proteinPer100g", body.protein_per_100g.unwrap_or(0.0))?,
            require_non_negative("fatPer100g", body.fat_per_100g.unwrap_or(0.0))?,
        ),
        weight_grams: require_non_negative("weightGrams", body.weight_grams)?,
        order: match body.order {
            Some(o) if o < 0 => return Err(bad_request("order must be non-negative")),
            other => other,
        },
    };

    let row = services::add_food(&state.db, user_id, meal_id, food).await?;
    info!(%user_id, %meal_id, food_id = %row.id, "food item added");
    Ok((
        StatusCode::CREATED,
        Json(FoodItemResponse {
            food_item: FoodItem::from(row),
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((meal_id, food_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateFoodRequest>,
) -> Result<Json<FoodItemResponse>, ApiError> {
    let patch = FoodPatch {
        name: body
            .name
            .as_deref()
            .map(|n| require_name(n, MAX_FOOD_NAME_LEN))
            .transpose()?,
        carbs_per_100g: optional_amount("carbsPer100g", body.carbs_per_100g)?,
        protein_per_100g: optional_amount("proteinPer100g", body.protein())?,
        fat_per_100g: optional_amount("fatPer100g", body.fat())?,
        weight_grams: optional_amount("weightGrams", body.weight_grams)?,
    };

    let row = services::update_food(&state.db, user_id, meal_id, food_id, patch).await?;
    Ok(Json(FoodItemResponse {
        food_item: FoodItem::from(row),
    }))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((meal_id, food_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let meal = services::delete_food(&state.db, user_id, meal_id, food_id).await?;
    Ok(Json(DeletedResponse {
        success: true,
        meal_id: meal.id,
    }))
}
