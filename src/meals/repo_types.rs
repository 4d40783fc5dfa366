use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::{FoodTotals, MealTotals, NutrientProfile};

#[derive(Debug, Clone, FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub time: String,
    pub notes: Option<String>,
    pub total_carbs: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_calories: f64,
    pub created_at: OffsetDateTime,
}

impl MealRow {
    pub fn totals(&self) -> MealTotals {
        MealTotals {
            total_carbs: self.total_carbs,
            total_protein: self.total_protein,
            total_fat: self.total_fat,
            total_calories: self.total_calories,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FoodItemRow {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub name: String,
    pub carbs_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    pub weight_grams: f64,
    pub total_carbs: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_calories: f64,
    pub position: i32,
    pub created_at: OffsetDateTime,
}

impl FoodItemRow {
    pub fn profile(&self) -> NutrientProfile {
        NutrientProfile::new(self.carbs_per_100g, self.protein_per_100g, self.fat_per_100g)
    }

    pub fn totals(&self) -> FoodTotals {
        FoodTotals {
            total_carbs: self.total_carbs,
            total_protein: self.total_protein,
            total_fat: self.total_fat,
            total_calories: self.total_calories,
        }
    }
}

/// Values for a food row about to be written.
#[derive(Debug, Clone)]
pub struct FoodValues {
    pub name: String,
    pub profile: NutrientProfile,
    pub weight_grams: f64,
    pub totals: FoodTotals,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub profile: NutrientProfile,
    pub weight_grams: f64,
    #[serde(flatten)]
    pub totals: FoodTotals,
    pub order: i32,
}

impl From<FoodItemRow> for FoodItem {
    fn from(r: FoodItemRow) -> Self {
        Self {
            id: r.id,
            meal_id: r.meal_id,
            profile: r.profile(),
            totals: r.totals(),
            name: r.name,
            weight_grams: r.weight_grams,
            order: r.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: Uuid,
    pub date: Date,
    pub time: String,
    /// "Завтрак", "Второй завтрак", ... derived from the time of day.
    pub name: String,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub totals: MealTotals,
    pub food_items: Vec<FoodItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Meal {
    pub fn from_row(row: MealRow, name: String, food_items: Vec<FoodItem>) -> Self {
        Self {
            id: row.id,
            date: row.date,
            totals: row.totals(),
            time: row.time,
            name,
            notes: row.notes,
            food_items,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_item_serializes_flat_camel_case() {
        let item = FoodItem {
            id: Uuid::nil(),
            meal_id: Uuid::nil(),
            name: "Гречка".into(),
            profile: NutrientProfile::new(20.0, 4.5, 0.8),
            weight_grams: 150.0,
            totals: crate::nutrition::scale_to_weight(&NutrientProfile::new(20.0, 4.5, 0.8), 150.0),
            order: 0,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["carbsPer100g"], 20.0);
        assert_eq!(json["weightGrams"], 150.0);
        assert_eq!(json["totalCarbs"], 30.0);
        assert_eq!(json["order"], 0);
        assert!(json.get("profile").is_none());
    }
}
