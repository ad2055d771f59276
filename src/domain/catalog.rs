//! Catalog query model: filters, sorting and aggregate statistics.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::jewelry::{Category, Gender, Material, Subcategory};
use crate::config::MAX_PAGE_NUMBER;
use crate::types::PaginationParams;

/// Predicates applied to a catalog listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub category: Option<Category>,
    pub subcategory: Option<Subcategory>,
    pub gender: Option<Gender>,
    pub material: Option<Material>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Only restrict to featured items when set
    pub featured_only: bool,
    pub search: Option<String>,
    pub active_only: bool,
}

impl CatalogFilter {
    /// Filter over active items only, the public default.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    pub fn for_category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::active()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Price,
    Name,
}

impl SortField {
    /// Unknown names fall back to creation time.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("updatedAt") => SortField::UpdatedAt,
            Some("price") => SortField::Price,
            Some("name") => SortField::Name,
            _ => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl CatalogSort {
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            field: SortField::parse(sort_by),
            order: SortOrder::parse(sort_order),
        }
    }
}

/// Query string accepted by the catalog listing.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    #[validate(range(
        min = 1,
        max = MAX_PAGE_NUMBER,
        message = "page must be between 1 and 1000000"
    ))]
    pub page: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    pub category: Option<Category>,
    pub subcategory: Option<Subcategory>,
    pub gender: Option<Gender>,
    pub material: Option<Material>,
    #[validate(range(min = 0.0, message = "minPrice must be non-negative"))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0, message = "maxPrice must be non-negative"))]
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    /// createdAt, updatedAt, price or name
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
}

impl CatalogQuery {
    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            category: self.category,
            subcategory: self.subcategory,
            gender: self.gender,
            material: self.material,
            min_price: self.min_price,
            max_price: self.max_price,
            featured_only: self.featured == Some(true),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            active_only: true,
        }
    }

    pub fn sort(&self) -> CatalogSort {
        CatalogSort::parse(self.sort_by.as_deref(), self.sort_order.as_deref())
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

/// Query string for category listings.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CategoryQuery {
    #[validate(range(
        min = 1,
        max = MAX_PAGE_NUMBER,
        message = "page must be between 1 and 1000000"
    ))]
    pub page: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl CategoryQuery {
    pub fn sort(&self) -> CatalogSort {
        CatalogSort::parse(self.sort_by.as_deref(), self.sort_order.as_deref())
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

/// Query string for full-text search.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[validate(range(
        min = 1,
        max = MAX_PAGE_NUMBER,
        message = "page must be between 1 and 1000000"
    ))]
    pub page: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
}

impl SearchQuery {
    /// The trimmed search term, if any.
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

/// Public statistics over active items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_items: u64,
    pub total_categories: u64,
    pub total_materials: u64,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Whole-catalog totals for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_items: u64,
    pub active_items: u64,
    pub featured_items: u64,
    pub total_value: f64,
    pub avg_price: Option<f64>,
}

/// Per-group count and average price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupStat {
    #[serde(rename = "_id")]
    pub key: String,
    pub count: u64,
    pub avg_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub overview: DashboardOverview,
    pub category_stats: Vec<GroupStat>,
    pub material_stats: Vec<GroupStat>,
}

/// Round a price aggregate to two decimal places.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
