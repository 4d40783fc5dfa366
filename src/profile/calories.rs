//! Optimal weight by BMI and daily calorie needs (Mifflin-St Jeor, sex-averaged).

use time::Date;

const OPTIMAL_BMI: f64 = 21.5;
const LIGHT_ACTIVITY: f64 = 1.375;
const MIN_DAILY_KCAL: f64 = 800.0;
const MAX_DAILY_KCAL: f64 = 5000.0;

/// Roughly 0.5 kg a week.
pub const SUGGESTED_CALORIE_DEFICIT: i32 = 500;

/// Kilograms, one decimal. `None` for non-positive heights.
pub fn optimal_weight(height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 {
        return None;
    }
    let h = height_cm / 100.0;
    Some((h * h * OPTIMAL_BMI * 10.0).round() / 10.0)
}

/// Full years on `today`; `None` when born after it.
pub fn age_on(birth: Date, today: Date) -> Option<i32> {
    let mut age = today.year() - birth.year();
    if (u8::from(today.month()), today.day()) < (u8::from(birth.month()), birth.day()) {
        age -= 1;
    }
    (age >= 0).then_some(age)
}

pub fn daily_calories_needed(
    height_cm: f64,
    weight_kg: f64,
    birth: Option<Date>,
    today: Date,
) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let age = age_on(birth?, today).filter(|a| (10..=120).contains(a))?;
    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) - 78.0;
    Some((bmr * LIGHT_ACTIVITY).clamp(MIN_DAILY_KCAL, MAX_DAILY_KCAL).round())
}

pub fn target_calories(daily: f64, deficit: f64) -> f64 {
    (daily - deficit).round().max(0.0)
}
