use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{FoodItem, Meal};

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its calendar date is used).
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok().map(|dt| dt.date()))
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealRequest {
    pub time: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub meal: Meal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodRequest {
    pub name: String,
    pub carbs_per_100g: f64,
    pub protein_per_100g: Option<f64>,
    pub fat_per_100g: Option<f64>,
    pub weight_grams: f64,
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFoodRequest {
    pub name: Option<String>,
    pub carbs_per_100g: Option<f64>,
    /// `null` resets the value to zero.
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub protein_per_100g: Option<Option<f64>>,
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub fat_per_100g: Option<Option<f64>>,
    pub weight_grams: Option<f64>,
}

impl UpdateFoodRequest {
    pub fn protein(&self) -> Option<f64> {
        self.protein_per_100g.map(|v| v.unwrap_or(0.0))
    }

    pub fn fat(&self) -> Option<f64> {
        self.fat_per_100g.map(|v| v.unwrap_or(0.0))
    }
}

impl UpdateMealRequest {
    /// `None` keeps the notes; `Some(None)` clears them (`null` or blank).
    pub fn notes(&self) -> Option<Option<String>> {
        self.notes.as_ref().map(|n| {
            n.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemResponse {
    pub food_item: FoodItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub success: bool,
    pub meal_id: Uuid,
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn dates_parse_from_plain_and_rfc3339() {
        assert_eq!(parse_date("2025-03-01"), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date("2025-03-01T00:00:00.000Z"), Some(date!(2025 - 03 - 01)));
        assert_eq!(parse_date("01.03.2025"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn food_request_optional_macros() {
        let req: CreateFoodRequest = serde_json::from_value(serde_json::json!({
            "name": "Яблоко",
            "carbsPer100g": 11.4,
            "weightGrams": 180
        }))
        .unwrap();
        assert_eq!(req.protein_per_100g, None);
        assert_eq!(req.weight_grams, 180.0);
        assert_eq!(req.order, None);
    }

    fn food_patch(body: serde_json::Value) -> UpdateFoodRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn null_macro_in_food_patch_resets_to_zero() {
        let req = food_patch(serde_json::json!({ "proteinPer100g": null }));
        assert_eq!(req.protein(), Some(0.0));
        assert_eq!(req.fat(), None);

        let req = food_patch(serde_json::json!({ "fatPer100g": 3.5, "weightGrams": 120 }));
        assert_eq!(req.protein(), None);
        assert_eq!(req.fat(), Some(3.5));
        assert_eq!(req.weight_grams, Some(120.0));
    }

    #[test]
    fn meal_notes_can_be_cleared() {
        let parse = |v: serde_json::Value| serde_json::from_value::<UpdateMealRequest>(v).unwrap();
        assert_eq!(parse(serde_json::json!({ "time": "9:05" })).notes(), None);
        assert_eq!(parse(serde_json::json!({ "notes": null })).notes(), Some(None));
        assert_eq!(parse(serde_json::json!({ "notes": "  " })).notes(), Some(None));
        assert_eq!(
            parse(serde_json::json!({ "notes": " после тренировки " })).notes(),
            Some(Some("после тренировки".into()))
        );
    }
}
