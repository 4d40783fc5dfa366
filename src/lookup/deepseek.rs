use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::reply::{parse_lookup_reply, parse_phrase_reply};
use super::{ExternalFood, LookupError, NutritionLookup, ParsedFood};
use crate::config::LookupConfig;

const MAX_TOKENS: u32 = 256;

const PHRASE_SYSTEM_PROMPT: &str = "Ты — эксперт по пищевой ценности продуктов. \
Извлеки из текста название продукта, его вес и БЖУ на 100 г.\n\
Примеры входных данных: \"150 г яблока гала\", \"яблоко гала 150г\", \
\"200 грамм гречки вареной\", \"молоко 3.2% 250мл\".\n\
Отвечай ТОЛЬКО JSON без дополнительного текста:\n\
{\"name\": \"название продукта\", \"weightGrams\": число (мл считай как граммы), \
\"carbsPer100g\": число, \"proteinPer100g\": число, \"fatPer100g\": число, \
\"sugarsPer100g\": число (0, если сахара нет)}\n\
Если точных данных нет, используй среднее значение для этого типа продукта.";

fn lookup_prompt(query: &str) -> String {
    format!(
        "Для продукта или блюда «{}» укажи БЖУ на 100 грамм и наличие сахара. \
Ответь только одним валидным JSON-объектом без markdown и без пояснений, в формате: \
{{\"name\": \"название продукта\", \"carbsPer100g\": число, \"proteinPer100g\": число, \
\"fatPer100g\": число, \"sugarsPer100g\": число}}. Все числа — только цифры, без единиц измерения. \
Если не уверен — дай разумную оценку.",
        query.trim()
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

/// Client for DeepSeek or any OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct DeepSeekClient {
    http: Client,
    config: LookupConfig,
}

impl DeepSeekClient {
    pub fn new(config: LookupConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn api_key(&self) -> Result<&str, LookupError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured)
    }

    /// Sends one chat completion and returns the trimmed reply text.
    async fn complete(&self, messages: Vec<ChatMessage<'_>>) -> Result<String, LookupError> {
        let api_key = self.api_key()?;
        let url = self.config.completions_url();
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(%url, model = %self.config.model, "lookup request");
        let res = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let raw = res.text().await?;
        if !status.is_success() {
            let head: String = raw.chars().take(300).collect();
            error!(status = status.as_u16(), body = %head, "lookup service error");
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| LookupError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LookupError::Malformed("empty completion".into()))
    }
}

#[async_trait]
impl NutritionLookup for DeepSeekClient {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> Result<ExternalFood, LookupError> {
        let prompt = lookup_prompt(query);
        let content = self
            .complete(vec![ChatMessage {
                role: "user",
                content: &prompt,
            }])
            .await?;
        parse_lookup_reply(&content, query).map_err(|e| {
            let head: String = content.chars().take(200).collect();
            warn!(error = %e, reply = %head, "unusable lookup reply");
            e
        })
    }

    #[instrument(skip(self))]
    async fn parse_phrase(&self, text: &str) -> Result<ParsedFood, LookupError> {
        let content = self
            .complete(vec![
                ChatMessage {
                    role: "system",
                    content: PHRASE_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text.trim(),
                },
            ])
            .await?;
        parse_phrase_reply(&content, text)
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}
