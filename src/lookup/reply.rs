use serde_json::{Map, Value};

use super::{ExternalFood, LookupError, ParsedFood};
use crate::nutrition::{non_negative, NutrientProfile};

/// Pulls the JSON object out of a chat reply that may be wrapped in a
/// markdown fence or surrounded by prose.
pub(super) fn extract_json_object(content: &str) -> Result<Map<String, Value>, LookupError> {
    let mut s = content.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.strip_prefix("json").unwrap_or(rest);
    }
    let s = s.trim_end().trim_end_matches("```").trim();

    let start = s
        .find('{')
        .ok_or_else(|| LookupError::Malformed("no JSON object in reply".into()))?;
    let end = s
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| LookupError::Malformed("unterminated JSON object in reply".into()))?;

    match serde_json::from_str::<Value>(&s[start..=end]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(LookupError::Malformed("reply JSON is not an object".into())),
        Err(e) => Err(LookupError::Malformed(e.to_string())),
    }
}

/// First present key among aliases, coerced to a number.
///
/// `None` when the key is missing or the value is not numeric.
fn number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let v = keys.iter().find_map(|k| obj.get(*k))?;
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .and_then(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
}

const NAME_KEYS: &[&str] = &["name", "product_name", "название"];
const CARBS_KEYS: &[&str] = &["carbsPer100g", "carbs", "углеводы"];
const PROTEIN_KEYS: &[&str] = &["proteinPer100g", "protein", "белки"];
const FAT_KEYS: &[&str] = &["fatPer100g", "fat", "жиры"];
const SUGARS_KEYS: &[&str] = &["sugarsPer100g", "sugars", "сахар"];

pub(super) fn parse_lookup_reply(content: &str, query: &str) -> Result<ExternalFood, LookupError> {
    let obj = extract_json_object(content)?;

    let carbs = number(&obj, CARBS_KEYS);
    let protein = number(&obj, PROTEIN_KEYS);
    let fat = number(&obj, FAT_KEYS);
    if carbs.is_none() && protein.is_none() && fat.is_none() {
        return Err(LookupError::Malformed("reply has no numeric macros".into()));
    }

    Ok(ExternalFood {
        name: text(&obj, NAME_KEYS).unwrap_or_else(|| query.trim().to_string()),
        profile: NutrientProfile::new(
            carbs.unwrap_or(0.0),
            protein.unwrap_or(0.0),
            fat.unwrap_or(0.0),
        )
        .clamped(),
        sugars_per_100g: number(&obj, SUGARS_KEYS).map(non_negative),
    })
}

pub(super) fn parse_phrase_reply(content: &str, text_in: &str) -> Result<ParsedFood, LookupError> {
    let obj = extract_json_object(content)?;

    let weight = number(&obj, &["weightGrams", "weight"])
        .filter(|w| *w != 0.0)
        .unwrap_or(100.0);

    Ok(ParsedFood {
        name: text(&obj, NAME_KEYS).unwrap_or_else(|| text_in.trim().to_string()),
        weight_grams: non_negative(weight),
        profile: NutrientProfile::new(
            number(&obj, CARBS_KEYS).unwrap_or(0.0),
            number(&obj, PROTEIN_KEYS).unwrap_or(0.0),
            number(&obj, FAT_KEYS).unwrap_or(0.0),
        )
        .clamped(),
        sugars_per_100g: number(&obj, SUGARS_KEYS).map(non_negative),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_reply() {
        let food = parse_lookup_reply(
            r#"{"name": "Гречка отварная", "carbsPer100g": 20, "proteinPer100g": 4.5, "fatPer100g": 0.8, "sugarsPer100g": 0}"#,
            "гречка",
        )
        .unwrap();
        assert_eq!(food.name, "Гречка отварная");
        assert_eq!(food.profile, NutrientProfile::new(20.0, 4.5, 0.8));
        assert_eq!(food.sugars_per_100g, Some(0.0));
    }

    #[test]
    fn fenced_reply_with_prose_and_aliases() {
        let content = "```json\nВот ответ: {\"название\": \"Яблоко\", \"углеводы\": \"9,8\", \"белки\": 0.4, \"жиры\": 0.4}\n```";
        let food = parse_lookup_reply(content, "яблоко").unwrap();
        assert_eq!(food.name, "Яблоко");
        assert!((food.profile.carbs_per_100g - 9.8).abs() < 1e-9);
        assert_eq!(food.sugars_per_100g, None);
    }

    #[test]
    fn missing_name_falls_back_to_query_and_negatives_are_clamped() {
        let food = parse_lookup_reply(r#"{"carbs": -3, "protein": 10}"#, "  творог ").unwrap();
        assert_eq!(food.name, "творог");
        assert_eq!(food.profile, NutrientProfile::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn reply_without_macros_is_malformed() {
        let err = parse_lookup_reply(r#"{"name": "что-то", "carbs": "много"}"#, "x").unwrap_err();
        assert!(matches!(err, LookupError::Malformed(_)));
    }

    #[test]
    fn reply_without_json_is_malformed() {
        assert!(matches!(
            parse_lookup_reply("не знаю", "x"),
            Err(LookupError::Malformed(_))
        ));
        assert!(matches!(
            parse_lookup_reply("} {", "x"),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn phrase_reply_defaults_weight() {
        let parsed = parse_phrase_reply(
            r#"{"name": "молоко 3.2%", "weightGrams": 250, "carbsPer100g": 4.7, "proteinPer100g": 2.9, "fatPer100g": 3.2}"#,
            "молоко 3.2% 250мл",
        )
        .unwrap();
        assert_eq!(parsed.weight_grams, 250.0);
        assert_eq!(parsed.name, "молоко 3.2%");

        let no_weight = parse_phrase_reply(r#"{"carbsPer100g": 10}"#, " банан ").unwrap();
        assert_eq!(no_weight.weight_grams, 100.0);
        assert_eq!(no_weight.name, "банан");
        assert_eq!(no_weight.profile, NutrientProfile::new(10.0, 0.0, 0.0));
    }
}
