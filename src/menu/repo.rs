use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::NutrientProfile;

/// Saved dish with its per-100g profile.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub carbs_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    pub calories_per_100g: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl MenuItem {
    pub fn profile(&self) -> NutrientProfile {
        NutrientProfile::new(self.carbs_per_100g, self.protein_per_100g, self.fat_per_100g)
    }
}

const COLUMNS: &str = "id, user_id, name, carbs_per_100g, protein_per_100g, fat_per_100g, \
                       calories_per_100g, created_at, updated_at";

/// All items of a user in ascending name order.
pub async fn list_all(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<MenuItem>> {
    let rows = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE user_id = $1 ORDER BY name ASC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list menu items")?;
    Ok(rows)
}

pub async fn list_page(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<MenuItem>, i64)> {
    let rows = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE user_id = $1 ORDER BY name ASC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list menu page")?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("count menu items")?;

    Ok((rows, total))
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<MenuItem>> {
    let row = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find menu item")?;
    Ok(row)
}

/// Inserts a dish or overwrites the nutrients of the one with the same name.
pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    profile: &NutrientProfile,
) -> anyhow::Result<MenuItem> {
    let row = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        INSERT INTO menu_items (user_id, name, carbs_per_100g, protein_per_100g, fat_per_100g, calories_per_100g)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, name) DO UPDATE
           SET carbs_per_100g = EXCLUDED.carbs_per_100g,
               protein_per_100g = EXCLUDED.protein_per_100g,
               fat_per_100g = EXCLUDED.fat_per_100g,
               calories_per_100g = EXCLUDED.calories_per_100g,
               updated_at = now()
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(profile.carbs_per_100g)
    .bind(profile.protein_per_100g)
    .bind(profile.fat_per_100g)
    .bind(profile.calories_per_100g())
    .fetch_one(db)
    .await
    .context("upsert menu item")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    name: &str,
    profile: &NutrientProfile,
) -> anyhow::Result<Option<MenuItem>> {
    let row = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        UPDATE menu_items
           SET name = $3, carbs_per_100g = $4, protein_per_100g = $5, fat_per_100g = $6,
               calories_per_100g = $7, updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(profile.carbs_per_100g)
    .bind(profile.protein_per_100g)
    .bind(profile.fat_per_100g)
    .bind(profile.calories_per_100g())
    .fetch_optional(db)
    .await
    .context("update menu item")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM menu_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete menu item")?;
    Ok(res.rows_affected() > 0)
}
