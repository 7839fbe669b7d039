//! Common query parameter structs for pagination and date filtering

use crate::backend::SortDirection;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Deserialize numbers from the query string (which are always strings)
fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => s.parse().map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

/// Deserialize an optional value, treating an empty string as absent
fn deserialize_option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.trim().is_empty() => s.trim().parse().map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Pagination parameters for list endpoints
#[derive(Debug, Deserialize, Clone)]
pub struct PaginationParams {
    /// Max items to return (default: 50, max: 100)
    #[serde(default = "default_limit", deserialize_with = "deserialize_from_str")]
    pub limit: usize,
    #[serde(default, deserialize_with = "deserialize_from_str")]
    pub offset: usize,
    /// "asc" or "desc" (default: "desc")
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
}

fn default_limit() -> usize {
    50
}

fn default_sort_order() -> String {
    "desc".to_string()
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            sort_order: default_sort_order(),
        }
    }
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.limit > 100 {
            return Err("limit cannot exceed 100".to_string());
        }
        if !["asc", "desc"].contains(&self.sort_order.as_str()) {
            return Err("sort_order must be 'asc' or 'desc'".to_string());
        }
        Ok(())
    }

    pub fn validated_limit(&self) -> usize {
        self.limit.min(100)
    }

    pub fn direction(&self) -> SortDirection {
        SortDirection::from_param(&self.sort_order)
    }
}

/// Inclusive date range plus optional title search
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DateRangeQuery {
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    /// Total count of items matching the filter
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            has_more: offset + items.len() < total,
            items,
            total,
            limit,
            offset,
        }
    }

    /// Cut one page out of a complete, already ordered result
    pub fn page(all: Vec<T>, params: &PaginationParams) -> Self {
        let total = all.len();
        let limit = params.validated_limit();
        let items: Vec<T> = all.into_iter().skip(params.offset).take(limit).collect();
        Self::new(items, total, limit, params.offset)
    }
}
