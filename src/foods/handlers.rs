use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, instrument, warn};

use super::dto::{
    EntrySource, ParseFoodRequest, ParseFoodResponse, VoiceAddRequest, VoiceAddResponse,
    MAX_TEXT_LEN,
};
use super::phrase::{parse_food_phrase, ParsedPhrase};
use super::resolve::{resolve_food, ResolvedFood};
use crate::{
    auth::AuthUser,
    error::{bad_request, internal, ApiError},
    lookup::LookupError,
    meals::{
        self,
        naming::normalize_time,
        repo_types::FoodItem,
        services::{current_time_hhmm, NewFood},
    },
    menu,
    nutrition::NutrientProfile,
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/diary/add-by-voice", post(add_by_voice))
        .route("/foods/parse", post(parse_food))
}

fn validate_text(text: &str) -> Result<&str, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(bad_request("text must not be empty"));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(bad_request("text is too long"));
    }
    Ok(trimmed)
}

fn not_found_message(product: &str, lookup_configured: bool) -> String {
    if lookup_configured {
        format!(
            "Продукт «{product}» не найден в меню и по базе. Попробуйте другое название или добавьте блюдо в меню."
        )
    } else {
        format!(
            "Продукт «{product}» не найден в меню. Для поиска по базе укажите DEEPSEEK_API_KEY в .env"
        )
    }
}

/// Turns a resolution outcome into the entry to store, or the 404 to return.
fn entry_for(
    parsed: &ParsedPhrase,
    resolved: Option<ResolvedFood>,
    allow_placeholder: bool,
    lookup_configured: bool,
) -> Result<(NewFood, EntrySource), ApiError> {
    let weight_grams = f64::from(parsed.weight_grams);
    match resolved {
        Some(found) => Ok((
            NewFood {
                name: found.name,
                profile: found.profile,
                weight_grams,
                order: None,
            },
            found.provenance.into(),
        )),
        None if allow_placeholder => Ok((
            NewFood {
                name: parsed.product_name.clone(),
                profile: NutrientProfile::default(),
                weight_grams,
                order: None,
            },
            EntrySource::Placeholder,
        )),
        None => Err((
            StatusCode::NOT_FOUND,
            not_found_message(&parsed.product_name, lookup_configured),
        )),
    }
}

/// Time for a meal created by a voice entry: the client's if sent, else the diary clock.
fn new_meal_time(
    client: Option<&str>,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<String, ApiError> {
    match client {
        Some(raw) => normalize_time(raw).ok_or_else(|| bad_request("time must be HH:MM")),
        None => Ok(current_time_hhmm(now.to_offset(offset))),
    }
}

fn lookup_rejection(e: LookupError) -> ApiError {
    match e {
        LookupError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        other => {
            warn!(error = %other, "phrase parse failed upstream");
            (StatusCode::BAD_GATEWAY, "Failed to parse food".into())
        }
    }
}

#[instrument(skip(state, body))]
pub async fn add_by_voice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<VoiceAddRequest>,
) -> Result<Json<VoiceAddResponse>, ApiError> {
    let text = validate_text(&body.text)?;
    let parsed = parse_food_phrase(text);
    let date = match body.date.as_deref() {
        Some(raw) => Some(meals::parse_date(raw).ok_or_else(|| bad_request("invalid date"))?),
        None => None,
    };
    let time = new_meal_time(
        body.time.as_deref(),
        OffsetDateTime::now_utc(),
        state.config.utc_offset,
    )?;

    let target = meals::services::choose_meal(&state.db, user_id, body.meal_id, date).await?;

    let menu_items = menu::repo::list_all(&state.db, user_id)
        .await
        .map_err(internal)?;
    let resolved = resolve_food(&menu_items, state.lookup.as_ref(), &parsed.product_name).await;
    let (food, source) = entry_for(
        &parsed,
        resolved,
        body.allow_placeholder,
        state.lookup.is_configured(),
    )?;

    let (meal_id, row) =
        meals::services::add_to_target(&state.db, user_id, target, &time, food).await?;
    info!(%user_id, %meal_id, food_id = %row.id, ?source, "voice entry added");

    Ok(Json(VoiceAddResponse {
        success: true,
        food_item: FoodItem::from(row),
        source,
        meal_id,
        parsed,
    }))
}

#[instrument(skip(state, body))]
pub async fn parse_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<ParseFoodRequest>,
) -> Result<Json<ParseFoodResponse>, ApiError> {
    let text = validate_text(&body.text)?;
    let food = state
        .lookup
        .parse_phrase(text)
        .await
        .map_err(lookup_rejection)?;
    Ok(Json(ParseFoodResponse { food }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::resolve::Provenance;

    fn parsed(name: &str, grams: u32) -> ParsedPhrase {
        ParsedPhrase {
            product_name: name.into(),
            weight_grams: grams,
        }
    }

    #[test]
    fn resolved_food_keeps_provenance_and_weight() {
        let resolved = ResolvedFood {
            name: "Гречка".into(),
            profile: NutrientProfile::new(20.0, 4.5, 0.8),
            sugars_per_100g: None,
            provenance: Provenance::Menu,
        };
        let (food, source) = entry_for(&parsed("гречки", 200), Some(resolved), false, true).unwrap();
        assert_eq!(source, EntrySource::Menu);
        assert_eq!(food.name, "Гречка");
        assert_eq!(food.weight_grams, 200.0);
    }

    #[test]
    fn miss_without_placeholder_is_not_found() {
        let (status, msg) = entry_for(&parsed("мангостин", 100), None, false, false).unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(msg.contains("«мангостин»"));
        assert!(msg.contains("DEEPSEEK_API_KEY"));

        let (_, msg) = entry_for(&parsed("мангостин", 100), None, false, true).unwrap_err();
        assert!(msg.contains("по базе"));
    }

    #[test]
    fn miss_with_placeholder_inserts_zero_entry() {
        let (food, source) = entry_for(&parsed("мангостин", 150), None, true, true).unwrap();
        assert_eq!(source, EntrySource::Placeholder);
        assert_eq!(food.name, "мангостин");
        assert_eq!(food.profile, NutrientProfile::default());
        assert_eq!(food.weight_grams, 150.0);
    }

    #[test]
    fn new_meal_time_prefers_client_then_local_clock() {
        let now = time::macros::datetime!(2025-03-01 6:30 UTC);
        let moscow = UtcOffset::from_hms(3, 0, 0).unwrap();

        assert_eq!(new_meal_time(Some("8:15"), now, moscow).unwrap(), "08:15");
        assert_eq!(new_meal_time(None, now, moscow).unwrap(), "09:30");
        assert_eq!(new_meal_time(None, now, UtcOffset::UTC).unwrap(), "06:30");
        assert_eq!(
            new_meal_time(Some("25:00"), now, moscow).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn text_bounds() {
        assert_eq!(validate_text("  хлеб  ").unwrap(), "хлеб");
        assert!(validate_text("   ").is_err());
        assert!(validate_text(&"а".repeat(MAX_TEXT_LEN)).is_ok());
        assert!(validate_text(&"а".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn lookup_errors_map_to_gateway_statuses() {
        assert_eq!(
            lookup_rejection(LookupError::NotConfigured).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            lookup_rejection(LookupError::Status { status: 500 }).0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            lookup_rejection(LookupError::Malformed("no json".into())).0,
            StatusCode::BAD_GATEWAY
        );
    }
}
