use std::collections::HashMap;

use anyhow::Context;
use axum::http::StatusCode;
use sqlx::{PgConnection, PgPool};
use time::{Date, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::naming::display_names;
use super::repo;
use super::repo_types::{FoodItem, FoodItemRow, FoodValues, Meal, MealRow};
use crate::error::{internal, ApiError};
use crate::nutrition::{recompute_meal_totals, scale_to_weight, FoodTotals, MealTotals, NutrientProfile};

#[derive(Debug, thiserror::Error)]
pub enum DiaryError {
    #[error("Meal not found")]
    MealNotFound,
    #[error("Food item not found")]
    FoodNotFound,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DiaryError> for ApiError {
    fn from(e: DiaryError) -> Self {
        match e {
            DiaryError::MealNotFound | DiaryError::FoodNotFound => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            DiaryError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg),
            DiaryError::Internal(e) => internal(e),
        }
    }
}

/// A food entry before it is scaled and stored.
#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub profile: NutrientProfile,
    pub weight_grams: f64,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct FoodPatch {
    pub name: Option<String>,
    pub carbs_per_100g: Option<f64>,
    pub protein_per_100g: Option<f64>,
    pub fat_per_100g: Option<f64>,
    pub weight_grams: Option<f64>,
}

impl FoodPatch {
    fn apply(self, current: &FoodItemRow) -> FoodValues {
        let old = current.profile();
        let profile = NutrientProfile::new(
            self.carbs_per_100g.unwrap_or(old.carbs_per_100g),
            self.protein_per_100g.unwrap_or(old.protein_per_100g),
            self.fat_per_100g.unwrap_or(old.fat_per_100g),
        )
        .clamped();
        let weight_grams = self.weight_grams.unwrap_or(current.weight_grams);
        food_values(self.name.unwrap_or_else(|| current.name.clone()), profile, weight_grams)
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: Date,
    pub meals: Vec<Meal>,
    pub totals: MealTotals,
}

fn food_values(name: String, profile: NutrientProfile, weight_grams: f64) -> FoodValues {
    let profile = profile.clamped();
    let weight_grams = crate::nutrition::non_negative(weight_grams);
    FoodValues {
        totals: scale_to_weight(&profile, weight_grams),
        name,
        profile,
        weight_grams,
    }
}

/// Sums the meal's current rows and stores the result on the meal.
pub async fn recompute_totals(conn: &mut PgConnection, meal_id: Uuid) -> anyhow::Result<MealRow> {
    let rows = repo::list_foods(conn, meal_id).await?;
    let entries: Vec<FoodTotals> = rows.iter().map(FoodItemRow::totals).collect();
    let totals = recompute_meal_totals(&entries);
    debug!(%meal_id, entries = entries.len(), calories = totals.total_calories, "meal totals recomputed");
    repo::store_totals(conn, meal_id, &totals).await
}

/// Inserts into an existing meal and refreshes its totals. The caller owns the transaction.
pub async fn insert_entry(
    conn: &mut PgConnection,
    meal_id: Uuid,
    food: NewFood,
) -> anyhow::Result<FoodItemRow> {
    let position = match food.order {
        Some(order) => order,
        None => i32::try_from(repo::count_foods(conn, meal_id).await?).unwrap_or(i32::MAX),
    };
    let values = food_values(food.name, food.profile, food.weight_grams);
    let row = repo::insert_food(conn, meal_id, &values, position).await?;
    recompute_totals(conn, meal_id).await?;
    Ok(row)
}

pub async fn create_meal(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    time: &str,
    notes: Option<&str>,
) -> Result<MealRow, DiaryError> {
    let mut conn = db.acquire().await.context("acquire connection")?;
    let meal = repo::insert_meal(&mut conn, user_id, date, time, notes).await?;
    info!(%user_id, meal_id = %meal.id, %date, time, "meal created");
    Ok(meal)
}

pub async fn add_food(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    food: NewFood,
) -> Result<FoodItemRow, DiaryError> {
    let mut tx = db.begin().await.context("begin transaction")?;
    repo::find_meal(&mut tx, user_id, meal_id)
        .await?
        .ok_or(DiaryError::MealNotFound)?;
    let row = insert_entry(&mut tx, meal_id, food).await?;
    tx.commit().await.context("commit food insert")?;
    Ok(row)
}

pub async fn update_food(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    food_id: Uuid,
    patch: FoodPatch,
) -> Result<FoodItemRow, DiaryError> {
    let mut tx = db.begin().await.context("begin transaction")?;
    let current = repo::find_food(&mut tx, user_id, meal_id, food_id)
        .await?
        .ok_or(DiaryError::FoodNotFound)?;
    let values = patch.apply(&current);
    let row = repo::update_food(&mut tx, food_id, &values).await?;
    recompute_totals(&mut tx, meal_id).await?;
    tx.commit().await.context("commit food update")?;
    Ok(row)
}

pub async fn delete_food(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    food_id: Uuid,
) -> Result<MealRow, DiaryError> {
    let mut tx = db.begin().await.context("begin transaction")?;
    repo::find_food(&mut tx, user_id, meal_id, food_id)
        .await?
        .ok_or(DiaryError::FoodNotFound)?;
    repo::delete_food(&mut tx, food_id).await?;
    let meal = recompute_totals(&mut tx, meal_id).await?;
    tx.commit().await.context("commit food delete")?;
    Ok(meal)
}

/// Where a voice entry should go.
#[derive(Debug, Clone)]
pub enum MealTarget {
    Existing(MealRow),
    NewOn(Date),
}

/// Explicit meal id first, then the latest meal of `date`, then a new meal on `date`.
pub async fn choose_meal(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Option<Uuid>,
    date: Option<Date>,
) -> Result<MealTarget, DiaryError> {
    let mut conn = db.acquire().await.context("acquire connection")?;
    if let Some(id) = meal_id {
        let meal = repo::find_meal(&mut conn, user_id, id)
            .await?
            .ok_or(DiaryError::MealNotFound)?;
        return Ok(MealTarget::Existing(meal));
    }
    let date = date.ok_or_else(|| DiaryError::Invalid("mealId or date is required".into()))?;
    match repo::latest_meal_on(&mut conn, user_id, date).await? {
        Some(meal) => Ok(MealTarget::Existing(meal)),
        None => Ok(MealTarget::NewOn(date)),
    }
}

pub fn current_time_hhmm(now: OffsetDateTime) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

/// Inserts into the chosen meal, creating it first at `new_meal_time` when needed, in one transaction.
pub async fn add_to_target(
    db: &PgPool,
    user_id: Uuid,
    target: MealTarget,
    new_meal_time: &str,
    food: NewFood,
) -> Result<(Uuid, FoodItemRow), DiaryError> {
    let mut tx = db.begin().await.context("begin transaction")?;
    let meal_id = match target {
        MealTarget::Existing(meal) => meal.id,
        MealTarget::NewOn(date) => {
            let meal = repo::insert_meal(&mut tx, user_id, date, new_meal_time, None).await?;
            info!(%user_id, meal_id = %meal.id, %date, time = new_meal_time, "meal created for voice entry");
            meal.id
        }
    };
    let row = insert_entry(&mut tx, meal_id, food).await?;
    tx.commit().await.context("commit voice entry")?;
    Ok((meal_id, row))
}

/// Meals in time order with display names and foods, plus the day totals.
pub fn assemble_day(date: Date, meals: Vec<MealRow>, foods: Vec<FoodItemRow>) -> DayView {
    let names = display_names(&meals.iter().map(|m| m.time.as_str()).collect::<Vec<_>>());
    let totals: MealTotals = meals.iter().map(MealRow::totals).sum();

    let mut by_meal: HashMap<Uuid, Vec<FoodItem>> = HashMap::new();
    for food in foods {
        by_meal.entry(food.meal_id).or_default().push(FoodItem::from(food));
    }
    let meals = meals
        .into_iter()
        .zip(names)
        .map(|(meal, name)| {
            let items = by_meal.remove(&meal.id).unwrap_or_default();
            Meal::from_row(meal, name, items)
        })
        .collect();

    DayView { date, meals, totals }
}

pub async fn load_day(db: &PgPool, user_id: Uuid, date: Date) -> Result<DayView, DiaryError> {
    let meals = repo::list_meals_on(db, user_id, date).await?;
    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let foods = repo::list_foods_of_meals(db, &ids).await?;
    Ok(assemble_day(date, meals, foods))
}

/// A single meal with its foods, named relative to the other meals of its day.
pub async fn load_meal(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> Result<Meal, DiaryError> {
    let mut conn = db.acquire().await.context("acquire connection")?;
    let meal = repo::find_meal(&mut conn, user_id, meal_id)
        .await?
        .ok_or(DiaryError::MealNotFound)?;
    drop(conn);
    let day = load_day(db, user_id, meal.date).await?;
    day.meals
        .into_iter()
        .find(|m| m.id == meal_id)
        .ok_or(DiaryError::MealNotFound)
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    fn meal_row(time: &str, carbs: f64, calories: f64) -> MealRow {
        MealRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            date: date!(2025 - 03 - 01),
            time: time.into(),
            notes: None,
            total_carbs: carbs,
            total_protein: 0.0,
            total_fat: 0.0,
            total_calories: calories,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn food_row(meal_id: Uuid, name: &str, position: i32) -> FoodItemRow {
        let values = food_values(name.into(), NutrientProfile::new(10.0, 0.0, 0.0), 100.0);
        FoodItemRow {
            id: Uuid::new_v4(),
            meal_id,
            name: values.name,
            carbs_per_100g: 10.0,
            protein_per_100g: 0.0,
            fat_per_100g: 0.0,
            weight_grams: 100.0,
            total_carbs: values.totals.total_carbs,
            total_protein: values.totals.total_protein,
            total_fat: values.totals.total_fat,
            total_calories: values.totals.total_calories,
            position,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn food_values_clamp_and_scale() {
        let v = food_values("x".into(), NutrientProfile::new(-5.0, 10.0, 2.0), 250.0);
        assert_eq!(v.profile.carbs_per_100g, 0.0);
        assert_eq!(v.totals.total_protein, 25.0);
        assert_eq!(v.totals.total_fat, 5.0);
        assert_eq!(v.totals.total_calories, (40.0 + 18.0) * 2.5);

        let zero = food_values("x".into(), NutrientProfile::new(5.0, 5.0, 5.0), 0.0);
        assert_eq!(zero.totals, FoodTotals::default());
    }

    #[test]
    fn patch_merges_with_current_row() {
        let current = food_row(Uuid::nil(), "Гречка", 0);
        let merged = FoodPatch {
            weight_grams: Some(200.0),
            ..Default::default()
        }
        .apply(&current);
        assert_eq!(merged.name, "Гречка");
        assert_eq!(merged.profile.carbs_per_100g, 10.0);
        assert_eq!(merged.totals.total_carbs, 20.0);
        assert_eq!(merged.totals.total_calories, 80.0);
    }

    #[test]
    fn day_groups_foods_and_sums_meals() {
        let breakfast = meal_row("08:00", 30.0, 120.0);
        let second = meal_row("10:00", 10.0, 40.0);
        let foods = vec![
            food_row(second.id, "Яблоко", 0),
            food_row(breakfast.id, "Каша", 0),
            food_row(breakfast.id, "Чай", 1),
        ];

        let day = assemble_day(date!(2025 - 03 - 01), vec![breakfast, second], foods);

        assert_eq!(day.meals[0].name, "Завтрак");
        assert_eq!(day.meals[1].name, "Второй завтрак");
        assert_eq!(day.meals[0].food_items.len(), 2);
        assert_eq!(day.meals[0].food_items[1].name, "Чай");
        assert_eq!(day.meals[1].food_items[0].name, "Яблоко");
        assert_eq!(day.totals.total_carbs, 40.0);
        assert_eq!(day.totals.total_calories, 160.0);
    }

    #[test]
    fn empty_day_has_zero_totals() {
        let day = assemble_day(date!(2025 - 03 - 01), vec![], vec![]);
        assert!(day.meals.is_empty());
        assert_eq!(day.totals, MealTotals::default());
    }

    #[test]
    fn current_time_is_zero_padded() {
        assert_eq!(current_time_hhmm(datetime!(2025-03-01 7:05 UTC)), "07:05");
    }

    #[test]
    fn diary_errors_map_to_statuses() {
        let (s, _) = ApiError::from(DiaryError::MealNotFound);
        assert_eq!(s, StatusCode::NOT_FOUND);
        let (s, msg) = ApiError::from(DiaryError::Invalid("bad".into()));
        assert_eq!((s, msg.as_str()), (StatusCode::BAD_REQUEST, "bad"));
        let (s, _) = ApiError::from(DiaryError::Internal(anyhow::anyhow!("db down")));
        assert_eq!(s, StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn meal_for_new_user(db: &PgPool) -> MealRow {
        let user = crate::auth::repo_types::User::create(db, "diary@example.com", "hash", None)
            .await
            .unwrap();
        create_meal(db, user.id, date!(2025 - 03 - 01), "08:00", None)
            .await
            .unwrap()
    }

    /// Stored meal totals, checked against the sum of the meal's current rows.
    async fn stored_totals(db: &PgPool, meal: &MealRow) -> MealTotals {
        let mut conn = db.acquire().await.unwrap();
        let stored = repo::find_meal(&mut conn, meal.user_id, meal.id)
            .await
            .unwrap()
            .unwrap();
        let rows = repo::list_foods(&mut conn, meal.id).await.unwrap();
        let summed: MealTotals = rows.iter().map(FoodItemRow::totals).sum();
        assert_eq!(stored.totals(), summed);
        stored.totals()
    }

    fn new_food(name: &str, profile: NutrientProfile, weight_grams: f64) -> NewFood {
        NewFood {
            name: name.into(),
            profile,
            weight_grams,
            order: None,
        }
    }

    fn totals(carbs: f64, protein: f64, fat: f64, calories: f64) -> MealTotals {
        MealTotals {
            total_carbs: carbs,
            total_protein: protein,
            total_fat: fat,
            total_calories: calories,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn every_food_mutation_refreshes_meal_totals(db: PgPool) {
        let meal = meal_for_new_user(&db).await;
        assert_eq!(stored_totals(&db, &meal).await, MealTotals::default());

        let porridge = add_food(
            &db,
            meal.user_id,
            meal.id,
            new_food("Каша", NutrientProfile::new(10.0, 5.0, 2.0), 200.0),
        )
        .await
        .unwrap();
        assert_eq!(porridge.position, 0);
        assert_eq!(stored_totals(&db, &meal).await, totals(20.0, 10.0, 4.0, 156.0));

        let apple = add_food(
            &db,
            meal.user_id,
            meal.id,
            new_food("Яблоко", NutrientProfile::new(50.0, 0.0, 0.0), 100.0),
        )
        .await
        .unwrap();
        assert_eq!(apple.position, 1);
        assert_eq!(stored_totals(&db, &meal).await, totals(70.0, 10.0, 4.0, 356.0));

        let patch = FoodPatch {
            protein_per_100g: Some(0.0),
            ..Default::default()
        };
        let updated = update_food(&db, meal.user_id, meal.id, porridge.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.total_protein, 0.0);
        assert_eq!(updated.total_calories, 116.0);
        assert_eq!(stored_totals(&db, &meal).await, totals(70.0, 0.0, 4.0, 316.0));

        delete_food(&db, meal.user_id, meal.id, apple.id).await.unwrap();
        assert_eq!(stored_totals(&db, &meal).await, totals(20.0, 0.0, 4.0, 116.0));

        let emptied = delete_food(&db, meal.user_id, meal.id, porridge.id).await.unwrap();
        assert_eq!(emptied.totals(), MealTotals::default());
        assert_eq!(stored_totals(&db, &meal).await, MealTotals::default());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn voice_target_creates_meal_with_given_time(db: PgPool) {
        let meal = meal_for_new_user(&db).await;
        let day = date!(2025 - 03 - 02);

        let (meal_id, row) = add_to_target(
            &db,
            meal.user_id,
            MealTarget::NewOn(day),
            "19:30",
            new_food("Творог", NutrientProfile::new(3.0, 18.0, 5.0), 150.0),
        )
        .await
        .unwrap();
        assert_ne!(meal_id, meal.id);

        let created = load_meal(&db, meal.user_id, meal_id).await.unwrap();
        assert_eq!(created.name, "Ужин");
        assert_eq!(created.food_items.len(), 1);
        assert_eq!(created.totals, row.totals());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn foods_of_another_users_meal_are_not_found(db: PgPool) {
        let meal = meal_for_new_user(&db).await;
        let food = add_food(
            &db,
            meal.user_id,
            meal.id,
            new_food("Хлеб", NutrientProfile::new(49.0, 8.0, 3.0), 40.0),
        )
        .await
        .unwrap();

        let stranger = Uuid::new_v4();
        let res = delete_food(&db, stranger, meal.id, food.id).await;
        assert!(matches!(res, Err(DiaryError::FoodNotFound)));
        assert_eq!(stored_totals(&db, &meal).await, food.totals());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn meal_notes_are_kept_or_cleared(db: PgPool) {
        let meal = meal_for_new_user(&db).await;
        let note = Some(Some("после зала".to_string()));
        let noted = repo::update_meal(&db, meal.user_id, meal.id, None, note)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(noted.notes.as_deref(), Some("после зала"));

        let kept = repo::update_meal(&db, meal.user_id, meal.id, Some("09:00"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.notes.as_deref(), Some("после зала"));
        assert_eq!(kept.time, "09:00");

        let cleared = repo::update_meal(&db, meal.user_id, meal.id, None, Some(None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.notes, None);
    }
}
