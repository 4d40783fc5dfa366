use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Macro-nutrient composition of a food per 100 grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientProfile {
    pub carbs_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
}

impl NutrientProfile {
    pub fn new(carbs: f64, protein: f64, fat: f64) -> Self {
        Self {
            carbs_per_100g: carbs,
            protein_per_100g: protein,
            fat_per_100g: fat,
        }
    }

    /// Same profile with every field clamped to `>= 0` (NaN becomes 0).
    pub fn clamped(self) -> Self {
        Self::new(
            non_negative(self.carbs_per_100g),
            non_negative(self.protein_per_100g),
            non_negative(self.fat_per_100g),
        )
    }

    pub fn calories_per_100g(&self) -> f64 {
        calories_from_macros(self.protein_per_100g, self.carbs_per_100g, self.fat_per_100g)
    }

    pub fn has_macros(&self) -> bool {
        self.carbs_per_100g > 0.0 || self.protein_per_100g > 0.0 || self.fat_per_100g > 0.0
    }
}

/// Absolute amounts for a consumed portion, or a sum of portions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodTotals {
    pub total_carbs: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_calories: f64,
}

/// Meal and day aggregates share the shape of a single entry's totals.
pub type MealTotals = FoodTotals;

impl Add for FoodTotals {
    type Output = FoodTotals;

    fn add(self, rhs: Self) -> Self::Output {
        FoodTotals {
            total_carbs: self.total_carbs + rhs.total_carbs,
            total_protein: self.total_protein + rhs.total_protein,
            total_fat: self.total_fat + rhs.total_fat,
            total_calories: self.total_calories + rhs.total_calories,
        }
    }
}

impl Sum for FoodTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FoodTotals::default(), Add::add)
    }
}

impl<'a> Sum<&'a FoodTotals> for FoodTotals {
    fn sum<I: Iterator<Item = &'a FoodTotals>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// kcal from grams of macro-nutrients: 4 per gram of protein and carbs, 9 per gram of fat.
pub fn calories_from_macros(protein_g: f64, carbs_g: f64, fat_g: f64) -> f64 {
    4.0 * protein_g + 4.0 * carbs_g + 9.0 * fat_g
}

/// Scales a per-100g profile to the consumed weight.
///
/// Every code path that creates or edits a food entry goes through here.
pub fn scale_to_weight(profile: &NutrientProfile, weight_grams: f64) -> FoodTotals {
    let k = weight_grams / 100.0;
    FoodTotals {
        total_carbs: profile.carbs_per_100g * k,
        total_protein: profile.protein_per_100g * k,
        total_fat: profile.fat_per_100g * k,
        total_calories: profile.calories_per_100g() * k,
    }
}

pub fn recompute_meal_totals<'a, I>(entries: I) -> MealTotals
where
    I: IntoIterator<Item = &'a FoodTotals>,
{
    entries.into_iter().sum()
}

pub(crate) fn non_negative(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn calories_use_4_4_9_factors() {
        assert!(approx(calories_from_macros(0.0, 0.0, 0.0), 0.0));
        assert!(approx(calories_from_macros(10.0, 0.0, 0.0), 40.0));
        assert!(approx(calories_from_macros(0.0, 10.0, 0.0), 40.0));
        assert!(approx(calories_from_macros(0.0, 0.0, 10.0), 90.0));
        assert!(approx(calories_from_macros(3.0, 12.0, 1.5), 73.5));
    }

    #[test]
    fn scale_to_weight_is_linear_in_grams() {
        let oats = NutrientProfile::new(12.0, 3.0, 1.5);
        let t = scale_to_weight(&oats, 200.0);
        assert!(approx(t.total_carbs, 24.0));
        assert!(approx(t.total_protein, 6.0));
        assert!(approx(t.total_fat, 3.0));
        assert!(approx(t.total_calories, 147.0));

        let half = scale_to_weight(&oats, 50.0);
        assert!(approx(half.total_carbs, 6.0));
        assert!(approx(half.total_calories, 147.0 / 4.0));
    }

    #[test]
    fn zero_weight_yields_zero_totals() {
        let t = scale_to_weight(&NutrientProfile::new(70.0, 10.0, 20.0), 0.0);
        assert_eq!(t, FoodTotals::default());
    }

    #[test]
    fn recompute_of_empty_meal_is_zero() {
        let none: Vec<FoodTotals> = Vec::new();
        assert_eq!(recompute_meal_totals(&none), FoodTotals::default());
    }

    #[test]
    fn recompute_sums_and_ignores_order() {
        let a = scale_to_weight(&NutrientProfile::new(12.0, 3.0, 1.5), 200.0);
        let b = scale_to_weight(&NutrientProfile::new(20.0, 4.5, 0.8), 150.0);
        let c = scale_to_weight(&NutrientProfile::new(0.0, 25.0, 9.0), 120.0);

        let forward = recompute_meal_totals(&[a, b, c]);
        let backward = recompute_meal_totals(&[c, a, b]);

        assert!(approx(forward.total_carbs, a.total_carbs + b.total_carbs + c.total_carbs));
        assert!(approx(forward.total_fat, a.total_fat + b.total_fat + c.total_fat));
        assert!(approx(forward.total_calories, backward.total_calories));
        assert!(approx(forward.total_protein, backward.total_protein));
    }

    #[test]
    fn clamped_profile_drops_negatives_and_nan() {
        let p = NutrientProfile::new(-1.0, f64::NAN, 2.5).clamped();
        assert_eq!(p, NutrientProfile::new(0.0, 0.0, 2.5));
        assert!(p.has_macros());
        assert!(!NutrientProfile::default().has_macros());
    }
}
