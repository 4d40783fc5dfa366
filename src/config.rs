use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, UtcOffset};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

const DEFAULT_LOOKUP_URL: &str = "https://api.deepseek.com";
const DEFAULT_LOOKUP_MODEL: &str = "deepseek-chat";
const OPENAI_COMPAT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible chat endpoint used for food lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    /// `None` disables external lookups.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl LookupConfig {
    pub fn new(api_key: Option<String>, base_url: Option<String>, model: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_LOOKUP_URL.to_string());
        let model = model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if base_url.contains("openai.com") {
                    OPENAI_COMPAT_MODEL.to_string()
                } else {
                    DEFAULT_LOOKUP_MODEL.to_string()
                }
            });
        Self {
            api_key,
            base_url,
            model,
            timeout_secs: 15,
        }
    }

    pub fn completions_url(&self) -> String {
        if self.base_url.contains("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }
}

/// `+03:00`, `-05:30` or whole hours (`3`, `-5`).
pub fn parse_utc_offset(raw: &str) -> Option<UtcOffset> {
    let raw = raw.trim();
    UtcOffset::parse(raw, format_description!("[offset_hour sign:mandatory]:[offset_minute]"))
        .ok()
        .or_else(|| {
            let hours = raw.parse::<i8>().ok()?;
            UtcOffset::from_hms(hours, 0, 0).ok()
        })
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub lookup: LookupConfig,
    /// Offset of the diary's local clock; names meals created without a client time.
    pub utc_offset: UtcOffset,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutridiary".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutridiary-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let mut lookup = LookupConfig::new(
            std::env::var("DEEPSEEK_API_KEY").ok(),
            std::env::var("DEEPSEEK_API_URL").ok(),
            std::env::var("DEEPSEEK_MODEL").ok(),
        );
        if let Some(secs) = std::env::var("LOOKUP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            lookup.timeout_secs = secs;
        }
        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw)
                .with_context(|| format!("APP_UTC_OFFSET is not a valid offset: {raw}"))?,
            Err(_) => UtcOffset::UTC,
        };
        Ok(Self {
            database_url,
            jwt,
            lookup,
            utc_offset,
        })
    }
}
