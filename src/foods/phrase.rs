use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const DEFAULT_WEIGHT_GRAMS: u32 = 100;
pub const MAX_WEIGHT_GRAMS: u32 = 10_000;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"\d+").unwrap();
    static ref QUANTITY_RE: Regex = Regex::new(
        r"(?i)\d+\s*(?:граммов|грамм[а-я]*|гр|г|миллилитр[а-я]*|мл|килограмм[а-я]*|кг|литр[а-я]*|л)\b\.?"
    )
    .unwrap();
    static ref FILLER_RE: Regex = Regex::new(
        r"(?i)\b(?:добавь|добавить|добавьте|положи|положить|запиши|записать|запишите|введи|ввести|внеси|внести)\b\s*"
    )
    .unwrap();
    static ref TRAILING_UNIT_RE: Regex = Regex::new(r"(?i)\s*\b(?:граммов|грамм|гр\b\.?)\s*$").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPhrase {
    pub product_name: String,
    pub weight_grams: u32,
}

/// Splits an utterance like "150 г яблока гала" into a product name and a weight.
pub fn parse_food_phrase(text: &str) -> ParsedPhrase {
    let trimmed = text.trim();
    ParsedPhrase {
        product_name: extract_product_name(trimmed),
        weight_grams: extract_weight(trimmed),
    }
}

/// The first integer in the phrase, or [`DEFAULT_WEIGHT_GRAMS`] when missing or outside `(0, 10000]`.
pub fn extract_weight(phrase: &str) -> u32 {
    let grams = NUMBER_RE
        .find(phrase)
        .and_then(|m| m.as_str().parse::<u32>().ok());
    match grams {
        Some(n) if n > 0 && n <= MAX_WEIGHT_GRAMS => n,
        _ => DEFAULT_WEIGHT_GRAMS,
    }
}

/// Product name with quantities, units and filler verbs removed.
///
/// Never empty for a non-blank input: falls back to the trimmed text.
pub fn extract_product_name(text: &str) -> String {
    let trimmed = text.trim();
    let without_qty = QUANTITY_RE.replace_all(trimmed, " ");
    let without_filler = FILLER_RE.replace_all(&without_qty, "");
    let without_tail = TRAILING_UNIT_RE.replace(&without_filler, "");
    let cleaned = SPACES_RE.replace_all(without_tail.trim(), " ").trim().to_string();

    if cleaned.is_empty() {
        trimmed.to_string()
    } else {
        cleaned
    }
}
