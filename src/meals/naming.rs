//! Display names for meals, derived from the time of day.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    AfternoonSnack,
    Dinner,
    Snack,
}

impl MealPeriod {
    pub fn from_time(time: &str) -> Self {
        let hour = time
            .split(':')
            .next()
            .and_then(|h| h.trim().parse::<u32>().ok());
        match hour {
            Some(6..=10) => Self::Breakfast,
            Some(11..=14) => Self::Lunch,
            Some(15..=17) => Self::AfternoonSnack,
            Some(18..=21) => Self::Dinner,
            _ => Self::Snack,
        }
    }

    pub fn base_name(self) -> &'static str {
        match self {
            Self::Breakfast => "Завтрак",
            Self::Lunch => "Обед",
            Self::AfternoonSnack => "Полдник",
            Self::Dinner => "Ужин",
            Self::Snack => "Перекус",
        }
    }

    fn second_name(self) -> &'static str {
        match self {
            Self::Breakfast => "Второй завтрак",
            Self::Lunch => "Второй обед",
            Self::AfternoonSnack => "Второй полдник",
            Self::Dinner => "Второй ужин",
            Self::Snack => "Поздний перекус",
        }
    }

    /// `ordinal` is 1-based within the period.
    pub fn name(self, ordinal: usize) -> String {
        match ordinal {
            0 | 1 => self.base_name().to_string(),
            2 => self.second_name().to_string(),
            n => format!("{} {n}", self.base_name()),
        }
    }
}

/// Names for a day's meals; `times` must be sorted ascending.
pub fn display_names<S: AsRef<str>>(times: &[S]) -> Vec<String> {
    let periods: Vec<MealPeriod> = times.iter().map(|t| MealPeriod::from_time(t.as_ref())).collect();
    periods
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let ordinal = periods[..=i].iter().filter(|q| *q == p).count();
            p.name(ordinal)
        })
        .collect()
}

/// Accepts `H:MM` or `HH:MM` (00-23, 00-59) and returns it zero padded.
pub fn normalize_time(raw: &str) -> Option<String> {
    let (h, m) = raw.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.chars().chain(m.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hour: u8 = h.parse().ok()?;
    let minute: u8 = m.parse().ok()?;
    (hour < 24 && minute < 60).then(|| format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_boundaries() {
        assert_eq!(MealPeriod::from_time("05:59"), MealPeriod::Snack);
        assert_eq!(MealPeriod::from_time("06:00"), MealPeriod::Breakfast);
        assert_eq!(MealPeriod::from_time("10:59"), MealPeriod::Breakfast);
        assert_eq!(MealPeriod::from_time("11:00"), MealPeriod::Lunch);
        assert_eq!(MealPeriod::from_time("15:30"), MealPeriod::AfternoonSnack);
        assert_eq!(MealPeriod::from_time("21:45"), MealPeriod::Dinner);
        assert_eq!(MealPeriod::from_time("22:00"), MealPeriod::Snack);
        assert_eq!(MealPeriod::from_time("garbage"), MealPeriod::Snack);
    }

    #[test]
    fn repeated_periods_get_ordinals() {
        let names = display_names(&["07:00", "09:30", "10:15", "13:00", "23:00", "23:30"]);
        assert_eq!(
            names,
            vec![
                "Завтрак",
                "Второй завтрак",
                "Завтрак 3",
                "Обед",
                "Перекус",
                "Поздний перекус",
            ]
        );
    }

    #[test]
    fn same_time_meals_are_still_distinct() {
        assert_eq!(display_names(&["19:00", "19:00"]), vec!["Ужин", "Второй ужин"]);
    }

    #[test]
    fn times_are_validated_and_padded() {
        assert_eq!(normalize_time("8:05").as_deref(), Some("08:05"));
        assert_eq!(normalize_time("23:59").as_deref(), Some("23:59"));
        assert_eq!(normalize_time("24:00"), None);
        assert_eq!(normalize_time("12:60"), None);
        assert_eq!(normalize_time("12:5"), None);
        assert_eq!(normalize_time("123:00"), None);
        assert_eq!(normalize_time("ab:cd"), None);
    }
}
