use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::calories::{daily_calories_needed, optimal_weight, target_calories, SUGGESTED_CALORIE_DEFICIT};
use super::repo::ProfileRow;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub height: Option<Option<i32>>,
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub birth_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::nullable")]
    pub calorie_deficit: Option<Option<i32>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub height: Option<i32>,
    pub weight: Option<f64>,
    pub birth_date: Option<Date>,
    pub calorie_deficit: Option<i32>,
    pub optimal_weight: Option<f64>,
    pub daily_calories_needed: Option<f64>,
    pub suggested_deficit: i32,
    pub target_calories: Option<f64>,
}

impl ProfileView {
    pub fn new(row: ProfileRow, today: Date) -> Self {
        let height = f64::from(row.height.unwrap_or(0));
        let weight = row.weight.unwrap_or(0.0);
        let daily = daily_calories_needed(height, weight, row.birth_date, today);
        let deficit = row.calorie_deficit.unwrap_or(SUGGESTED_CALORIE_DEFICIT);
        Self {
            optimal_weight: optimal_weight(height),
            daily_calories_needed: daily,
            suggested_deficit: SUGGESTED_CALORIE_DEFICIT,
            target_calories: daily.map(|d| target_calories(d, f64::from(deficit))),
            id: row.id,
            email: row.email,
            name: row.name,
            height: row.height,
            weight: row.weight,
            birth_date: row.birth_date,
            calorie_deficit: row.calorie_deficit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub user: ProfileView,
}
