use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phrase::ParsedPhrase;
use super::resolve::Provenance;
use crate::lookup::ParsedFood;
use crate::meals::repo_types::FoodItem;

pub const MAX_TEXT_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAddRequest {
    pub text: String,
    pub meal_id: Option<Uuid>,
    /// `YYYY-MM-DD`; picks the day when no meal id is given.
    pub date: Option<String>,
    /// Client's local `HH:MM`, used when a new meal has to be created.
    pub time: Option<String>,
    #[serde(default)]
    pub allow_placeholder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Menu,
    External,
    Placeholder,
}

impl From<Provenance> for EntrySource {
    fn from(p: Provenance) -> Self {
        match p {
            Provenance::Menu => Self::Menu,
            Provenance::External => Self::External,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAddResponse {
    pub success: bool,
    pub food_item: FoodItem,
    pub source: EntrySource,
    pub meal_id: Uuid,
    pub parsed: ParsedPhrase,
}

#[derive(Debug, Deserialize)]
pub struct ParseFoodRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseFoodResponse {
    pub food: ParsedFood,
}
