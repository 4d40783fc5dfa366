//! Third-party text-to-nutrition lookup.
//!
//! The service is optional: a missing API key is a normal state and every
//! caller must cope with [`LookupError`].

mod deepseek;
mod reply;

pub use deepseek::DeepSeekClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::nutrition::NutrientProfile;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("external nutrition lookup is not configured (DEEPSEEK_API_KEY is empty)")]
    NotConfigured,
    #[error("lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("lookup service returned HTTP {status}")]
    Status { status: u16 },
    #[error("malformed lookup reply: {0}")]
    Malformed(String),
}

/// Profile suggested by the external service for a product query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFood {
    pub name: String,
    #[serde(flatten)]
    pub profile: NutrientProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugars_per_100g: Option<f64>,
}

/// Full phrase parse ("молоко 3.2% 250мл") done by the external service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFood {
    pub name: String,
    pub weight_grams: f64,
    #[serde(flatten)]
    pub profile: NutrientProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugars_per_100g: Option<f64>,
}

#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Per-100g macros for a product or dish name.
    async fn lookup(&self, query: &str) -> Result<ExternalFood, LookupError>;

    /// Name, weight and per-100g macros from a free-form phrase.
    async fn parse_phrase(&self, text: &str) -> Result<ParsedFood, LookupError>;

    fn is_configured(&self) -> bool;
}
