use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use time::Date;
use uuid::Uuid;

use super::repo_types::{FoodItemRow, FoodValues, MealRow};
use crate::nutrition::MealTotals;

const MEAL_COLUMNS: &str = "id, user_id, date, time, notes, total_carbs, total_protein, \
                            total_fat, total_calories, created_at";
const FOOD_COLUMNS: &str = "id, meal_id, name, carbs_per_100g, protein_per_100g, fat_per_100g, \
                            weight_grams, total_carbs, total_protein, total_fat, \
                            total_calories, position, created_at";

pub async fn insert_meal(
    conn: &mut PgConnection,
    user_id: Uuid,
    date: Date,
    time: &str,
    notes: Option<&str>,
) -> anyhow::Result<MealRow> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        INSERT INTO meals (id, user_id, date, time, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(time)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await
    .context("insert meal")?;
    Ok(row)
}

pub async fn find_meal(
    conn: &mut PgConnection,
    user_id: Uuid,
    meal_id: Uuid,
) -> anyhow::Result<Option<MealRow>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 AND user_id = $2"
    ))
    .bind(meal_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .context("find meal")?;
    Ok(row)
}

/// Meal with the greatest time on `date`.
pub async fn latest_meal_on(
    conn: &mut PgConnection,
    user_id: Uuid,
    date: Date,
) -> anyhow::Result<Option<MealRow>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {MEAL_COLUMNS} FROM meals
        WHERE user_id = $1 AND date = $2
        ORDER BY time DESC, created_at DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await
    .context("find latest meal of day")?;
    Ok(row)
}

pub async fn list_meals_on(db: &PgPool, user_id: Uuid, date: Date) -> anyhow::Result<Vec<MealRow>> {
    let rows = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {MEAL_COLUMNS} FROM meals
        WHERE user_id = $1 AND date = $2
        ORDER BY time ASC, created_at ASC
        "#
    ))
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await
    .context("list meals of day")?;
    Ok(rows)
}

pub async fn update_meal(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    time: Option<&str>,
    notes: Option<Option<String>>,
) -> anyhow::Result<Option<MealRow>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        UPDATE meals
        SET time = COALESCE($3, time),
            notes = CASE WHEN $4 THEN $5 ELSE notes END
        WHERE id = $1 AND user_id = $2
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(meal_id)
    .bind(user_id)
    .bind(time)
    .bind(notes.is_some())
    .bind(notes.flatten())
    .fetch_optional(db)
    .await
    .context("update meal")?;
    Ok(row)
}

/// Food items go with it through the FK cascade.
pub async fn delete_meal(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
        .bind(meal_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal")?;
    Ok(res.rows_affected() > 0)
}

pub async fn store_totals(
    conn: &mut PgConnection,
    meal_id: Uuid,
    totals: &MealTotals,
) -> anyhow::Result<MealRow> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        UPDATE meals
        SET total_carbs = $2, total_protein = $3, total_fat = $4, total_calories = $5
        WHERE id = $1
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(meal_id)
    .bind(totals.total_carbs)
    .bind(totals.total_protein)
    .bind(totals.total_fat)
    .bind(totals.total_calories)
    .fetch_one(&mut *conn)
    .await
    .context("store meal totals")?;
    Ok(row)
}

pub async fn list_foods(conn: &mut PgConnection, meal_id: Uuid) -> anyhow::Result<Vec<FoodItemRow>> {
    let rows = sqlx::query_as::<_, FoodItemRow>(&format!(
        "SELECT {FOOD_COLUMNS} FROM food_items WHERE meal_id = $1 ORDER BY position ASC, created_at ASC"
    ))
    .bind(meal_id)
    .fetch_all(&mut *conn)
    .await
    .context("list food items")?;
    Ok(rows)
}

pub async fn list_foods_of_meals(db: &PgPool, meal_ids: &[Uuid]) -> anyhow::Result<Vec<FoodItemRow>> {
    if meal_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, FoodItemRow>(&format!(
        r#"
        SELECT {FOOD_COLUMNS} FROM food_items
        WHERE meal_id = ANY($1)
        ORDER BY position ASC, created_at ASC
        "#
    ))
    .bind(meal_ids)
    .fetch_all(db)
    .await
    .context("list food items of meals")?;
    Ok(rows)
}

pub async fn count_foods(conn: &mut PgConnection, meal_id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM food_items WHERE meal_id = $1")
        .bind(meal_id)
        .fetch_one(&mut *conn)
        .await
        .context("count food items")?;
    Ok(n)
}

/// Scoped to the owner through the parent meal.
pub async fn find_food(
    conn: &mut PgConnection,
    user_id: Uuid,
    meal_id: Uuid,
    food_id: Uuid,
) -> anyhow::Result<Option<FoodItemRow>> {
    let row = sqlx::query_as::<_, FoodItemRow>(
        r#"
        SELECT f.id, f.meal_id, f.name, f.carbs_per_100g, f.protein_per_100g, f.fat_per_100g,
               f.weight_grams, f.total_carbs, f.total_protein, f.total_fat,
               f.total_calories, f.position, f.created_at
        FROM food_items f
        JOIN meals m ON m.id = f.meal_id
        WHERE f.id = $1 AND f.meal_id = $2 AND m.user_id = $3
        "#,
    )
    .bind(food_id)
    .bind(meal_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .context("find food item")?;
    Ok(row)
}

pub async fn insert_food(
    conn: &mut PgConnection,
    meal_id: Uuid,
    values: &FoodValues,
    position: i32,
) -> anyhow::Result<FoodItemRow> {
    let row = sqlx::query_as::<_, FoodItemRow>(&format!(
        r#"
        INSERT INTO food_items (id, meal_id, name, carbs_per_100g, protein_per_100g,
                                fat_per_100g, weight_grams, total_carbs, total_protein,
                                total_fat, total_calories, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {FOOD_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(meal_id)
    .bind(&values.name)
    .bind(values.profile.carbs_per_100g)
    .bind(values.profile.protein_per_100g)
    .bind(values.profile.fat_per_100g)
    .bind(values.weight_grams)
    .bind(values.totals.total_carbs)
    .bind(values.totals.total_protein)
    .bind(values.totals.total_fat)
    .bind(values.totals.total_calories)
    .bind(position)
    .fetch_one(&mut *conn)
    .await
    .context("insert food item")?;
    Ok(row)
}

pub async fn update_food(
    conn: &mut PgConnection,
    food_id: Uuid,
    values: &FoodValues,
) -> anyhow::Result<FoodItemRow> {
    let row = sqlx::query_as::<_, FoodItemRow>(&format!(
        r#"
        UPDATE food_items
        SET name = $2, carbs_per_100g = $3, protein_per_100g = $4, fat_per_100g = $5,
            weight_grams = $6, total_carbs = $7, total_protein = $8, total_fat = $9,
            total_calories = $10
        WHERE id = $1
        RETURNING {FOOD_COLUMNS}
        "#
    ))
    .bind(food_id)
    .bind(&values.name)
    .bind(values.profile.carbs_per_100g)
    .bind(values.profile.protein_per_100g)
    .bind(values.profile.fat_per_100g)
    .bind(values.weight_grams)
    .bind(values.totals.total_carbs)
    .bind(values.totals.total_protein)
    .bind(values.totals.total_fat)
    .bind(values.totals.total_calories)
    .fetch_one(&mut *conn)
    .await
    .context("update food item")?;
    Ok(row)
}

pub async fn delete_food(conn: &mut PgConnection, food_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM food_items WHERE id = $1")
        .bind(food_id)
        .execute(&mut *conn)
        .await
        .context("delete food item")?;
    Ok(())
}
