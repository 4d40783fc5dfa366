//! Resolves a product name to a nutrient profile.
//!
//! Precedence: menu item with macros > external lookup > menu item without
//! macros > nothing. The saved menu is always consulted before any network
//! call.

use serde::Serialize;
use tracing::{debug, warn};

use crate::lookup::NutritionLookup;
use crate::menu::{matching, MenuItem};
use crate::nutrition::NutrientProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Menu,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFood {
    pub name: String,
    pub profile: NutrientProfile,
    /// Only reported by the external service; not stored yet.
    pub sugars_per_100g: Option<f64>,
    pub provenance: Provenance,
}

fn from_menu(menu: &[MenuItem], query: &str) -> Option<ResolvedFood> {
    matching::find_match(menu, query, |item| item.name.as_str()).map(|item| ResolvedFood {
        name: item.name.clone(),
        profile: item.profile().clamped(),
        sugars_per_100g: None,
        provenance: Provenance::Menu,
    })
}

async fn from_external(lookup: &dyn NutritionLookup, query: &str) -> Option<ResolvedFood> {
    match lookup.lookup(query).await {
        Ok(found) => Some(ResolvedFood {
            name: found.name,
            profile: found.profile,
            sugars_per_100g: found.sugars_per_100g,
            provenance: Provenance::External,
        }),
        Err(e) => {
            warn!(error = %e, query, "external lookup gave no result");
            None
        }
    }
}

/// `menu` must be in ascending name order; the first matching item wins.
pub async fn resolve_food(
    menu: &[MenuItem],
    lookup: &dyn NutritionLookup,
    query: &str,
) -> Option<ResolvedFood> {
    if query.trim().is_empty() {
        return None;
    }

    let menu_hit = from_menu(menu, query);
    if let Some(hit) = menu_hit.as_ref().filter(|h| h.profile.has_macros()) {
        debug!(query, name = %hit.name, "resolved from menu");
        return Some(hit.clone());
    }

    if let Some(found) = from_external(lookup, query).await {
        debug!(query, name = %found.name, "resolved externally");
        return Some(found);
    }

    // a dish without macros is still better than nothing
    menu_hit
}
