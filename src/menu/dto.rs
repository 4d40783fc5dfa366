use serde::{Deserialize, Serialize};

use super::repo::MenuItem;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_NAME_LEN: usize = 500;
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
}

impl MenuQuery {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE)
    }

    /// Rows to skip; bounded by `MAX_PAGE * MAX_LIMIT`.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub carbs_per_100g: f64,
    #[serde(default)]
    pub protein_per_100g: Option<f64>,
    #[serde(default)]
    pub fat_per_100g: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub carbs_per_100g: Option<f64>,
    pub protein_per_100g: Option<f64>,
    pub fat_per_100g: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MenuPage {
    pub items: Vec<MenuItem>,
    pub pagination: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct MenuItemResponse {
    pub item: MenuItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, limit: Option<i64>, search: Option<&str>) -> MenuQuery {
        MenuQuery {
            page,
            limit,
            search: search.map(String::from),
        }
    }

    #[test]
    fn paging_defaults_and_clamps() {
        let q = query(None, None, None);
        assert_eq!((q.page(), q.limit()), (1, DEFAULT_LIMIT));

        let q = query(Some(0), Some(1000), None);
        assert_eq!((q.page(), q.limit()), (1, MAX_LIMIT));

        let q = query(Some(3), Some(-5), None);
        assert_eq!((q.page(), q.limit()), (3, DEFAULT_LIMIT));
    }

    #[test]
    fn huge_page_is_capped_without_overflow() {
        let q = query(Some(i64::MAX), Some(MAX_LIMIT), Some("x"));
        assert_eq!(q.page(), MAX_PAGE);
        assert_eq!(q.offset(), (MAX_PAGE - 1) * MAX_LIMIT);

        let q = query(Some(3), Some(20), None);
        assert_eq!(q.offset(), 40);
        assert_eq!(query(None, None, None).offset(), 0);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(query(None, None, Some("  ")).search(), None);
        assert_eq!(query(None, None, Some(" Каша ")).search().as_deref(), Some("каша"));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageInfo::new(1, 10, 0).total_pages, 0);
        assert_eq!(PageInfo::new(1, 10, 10).total_pages, 1);
        assert_eq!(PageInfo::new(1, 10, 11).total_pages, 2);
    }
}
