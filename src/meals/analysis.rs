//! Rough per-meal feedback: macro adequacy, vegetables, junk food.

use serde::Serialize;

use crate::nutrition::MealTotals;

const VEGETABLE_KEYWORDS: &[&str] = &[
    "овощ", "салат", "огурец", "помидор", "томат", "капуста", "морковь", "свёкла", "редис",
    "перец", "баклажан", "кабачок", "тыква", "лук", "чеснок", "зелень", "укроп", "петрушка",
    "шпинат", "руккола", "брокколи", "цветная", "горох", "фасоль", "чечевица",
];

const JUNK_KEYWORDS: &[&str] = &[
    "фастфуд", "бургер", "пицца", "чипсы", "сухарики", "кола", "газировка", "сникерс", "марс",
    "шоколад", "конфет", "пирожное", "торт", "мороженое", "майонез", "кетчуп", "сосиск",
    "колбас", "жарен", "фри", "донат", "пончик", "чизбургер", "наггетс", "хот-дог", "печенье",
    "вафл", "булочк", "сдоб", "беляш", "чебурек", "сахар", "попкорн",
];

const DAILY_PROTEIN_MIN: f64 = 60.0;
const DAILY_CARBS_MIN: f64 = 150.0;
const DAILY_FAT_MIN: f64 = 40.0;
/// Share of the daily minimum expected from one of 4-5 meals.
const PER_MEAL_SHARE: f64 = 0.22;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub total_calories: f64,
    pub has_vegetables: bool,
    pub has_junk_food: bool,
    pub junk_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealAnalysis {
    pub analysis: String,
    pub summary: AnalysisSummary,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| name.contains(kw))
}

/// `names` are the meal's food names in display order.
pub fn analyze_meal<S: AsRef<str>>(totals: &MealTotals, names: &[S]) -> MealAnalysis {
    let lower: Vec<String> = names.iter().map(|n| n.as_ref().to_lowercase()).collect();
    let has_vegetables = lower.iter().any(|n| contains_any(n, VEGETABLE_KEYWORDS));
    let junk_items: Vec<String> = lower
        .into_iter()
        .filter(|n| contains_any(n, JUNK_KEYWORDS))
        .collect();

    let protein = totals.total_protein;
    let carbs = totals.total_carbs;
    let fat = totals.total_fat;

    let mut messages = Vec::with_capacity(6);
    messages.push(if protein >= DAILY_PROTEIN_MIN * PER_MEAL_SHARE {
        format!("Белки: достаточно ({} г в приёме).", protein.round())
    } else {
        format!("Белки: мало ({} г). Рекомендуется добавить белковые продукты.", protein.round())
    });
    messages.push(if carbs >= DAILY_CARBS_MIN * PER_MEAL_SHARE {
        format!("Углеводы: достаточно ({} г).", carbs.round())
    } else {
        format!("Углеводы: мало ({} г). Можно добавить крупы или овощи.", carbs.round())
    });
    messages.push(if fat >= DAILY_FAT_MIN * PER_MEAL_SHARE {
        format!("Жиры: достаточно ({} г).", fat.round())
    } else {
        format!("Жиры: мало ({} г). Умеренно добавьте орехи, масло, рыбу.", fat.round())
    });
    messages.push(if has_vegetables {
        "Овощи в приёме есть — хорошо.".to_string()
    } else {
        "Овощей в приёме нет. Рекомендуется добавить овощи или зелень.".to_string()
    });
    messages.push(if junk_items.is_empty() {
        "Вредной пищи в приёме не обнаружено.".to_string()
    } else {
        format!(
            "Вредная/калорийная пища: обнаружено — {}. Рекомендуется ограничить.",
            junk_items.join(", ")
        )
    });
    messages.push(format!(
        "Калорийность приёма: {} ккал.",
        totals.total_calories.round()
    ));

    MealAnalysis {
        analysis: messages.join(" "),
        summary: AnalysisSummary {
            total_protein: round1(protein),
            total_carbs: round1(carbs),
            total_fat: round1(fat),
            total_calories: totals.total_calories.round(),
            has_vegetables,
            has_junk_food: !junk_items.is_empty(),
            junk_items,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(carbs: f64, protein: f64, fat: f64, calories: f64) -> MealTotals {
        MealTotals {
            total_carbs: carbs,
            total_protein: protein,
            total_fat: fat,
            total_calories: calories,
        }
    }

    #[test]
    fn balanced_meal_with_vegetables() {
        let a = analyze_meal(&totals(40.0, 25.0, 12.0, 368.0), &["Курица", "Салат овощной"]);
        assert!(a.summary.has_vegetables);
        assert!(!a.summary.has_junk_food);
        assert!(a.analysis.starts_with("Белки: достаточно (25 г в приёме)."));
        assert!(a.analysis.contains("Вредной пищи в приёме не обнаружено."));
        assert!(a.analysis.ends_with("Калорийность приёма: 368 ккал."));
    }

    #[test]
    fn junk_items_are_reported_lowercased() {
        let a = analyze_meal(&totals(10.0, 2.0, 3.0, 75.0), &["Чипсы Lays", "Чай"]);
        assert_eq!(a.summary.junk_items, vec!["чипсы lays".to_string()]);
        assert!(a.summary.has_junk_food);
        assert!(a.analysis.contains("Белки: мало (2 г)."));
        assert!(a.analysis.contains("Овощей в приёме нет."));
    }

    #[test]
    fn halves_round_up_in_messages() {
        let a = analyze_meal(&totals(2.5, 12.5, 0.5, 70.0), &["творог"]);
        assert!(a.analysis.contains("Белки: мало (13 г)."));
        assert!(a.analysis.contains("Углеводы: мало (3 г)."));
        assert!(a.analysis.contains("Жиры: мало (1 г)."));
    }

    #[test]
    fn summary_is_rounded() {
        let a = analyze_meal(&totals(33.04, 13.26, 8.85, 265.6), &[] as &[&str]);
        assert_eq!(a.summary.total_carbs, 33.0);
        assert_eq!(a.summary.total_protein, 13.3);
        assert_eq!(a.summary.total_fat, 8.9);
        assert_eq!(a.summary.total_calories, 266.0);
    }

    #[test]
    fn thresholds_are_a_share_of_daily_minimums() {
        // 60 * 0.22 = 13.2
        let a = analyze_meal(&totals(0.0, 13.2, 0.0, 0.0), &[] as &[&str]);
        assert!(a.analysis.starts_with("Белки: достаточно"));
        let b = analyze_meal(&totals(0.0, 13.1, 0.0, 0.0), &[] as &[&str]);
        assert!(b.analysis.starts_with("Белки: мало"));
    }
}
