//! Select query builder with PostgREST encoding

use serde::{Deserialize, Serialize};

/// Sort direction for ordered selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse the `sort_order` query value used by list endpoints
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A single column filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// `column >= value`
    Gte { column: String, value: String },
    /// `column <= value`
    Lte { column: String, value: String },
    /// Case-insensitive substring match on `column`
    ILike { column: String, needle: String },
}

impl Filter {
    /// Column this filter applies to
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. }
            | Filter::Gte { column, .. }
            | Filter::Lte { column, .. }
            | Filter::ILike { column, .. } => column,
        }
    }

    fn encode(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
            Filter::Gte { column, value } => (column.clone(), format!("gte.{}", value)),
            Filter::Lte { column, value } => (column.clone(), format!("lte.{}", value)),
            Filter::ILike { column, needle } => {
                (column.clone(), format!("ilike.*{}*", escape_like(needle)))
            }
        }
    }
}

/// Make user search text literal inside an `ilike` pattern.
///
/// `%`, `_` and `\` are backslash-escaped. PostgREST rewrites every `*` to
/// `%` with no escape, so `*` is dropped.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        match c {
            '*' => {}
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Select query against one table.
///
/// ```rust,ignore
/// let q = SelectQuery::new()
///     .eq("user_id", user_id)
///     .between("date", from, to)
///     .order_by("date", SortDirection::Asc);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::Gte {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn lte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::Lte {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Inclusive range on one column. Either bound may be omitted.
    pub fn between<T: ToString>(mut self, column: &str, from: Option<T>, to: Option<T>) -> Self {
        if let Some(from) = from {
            self = self.gte(column, from);
        }
        if let Some(to) = to {
            self = self.lte(column, to);
        }
        self
    }

    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.filters.push(Filter::ILike {
            column: column.to_string(),
            needle: needle.to_string(),
        });
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order = Some((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Encode as PostgREST query string pairs
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filters.iter().map(Filter::encode));
        if let Some((column, direction)) = &self.order {
            params.push(("order".to_string(), format!("{}.{}", column, direction.as_str())));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_selects_everything() {
        let params = SelectQuery::new().to_params();
        assert_eq!(params, vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn test_between_with_open_bounds() {
        let q = SelectQuery::new().between::<String>("date", None, Some("2024-01-31".into()));
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters[0].column(), "date");

        let q = SelectQuery::new().between("date", Some("2024-01-01"), Some("2024-01-31"));
        let params = q.to_params();
        assert!(params.contains(&("date".to_string(), "gte.2024-01-01".to_string())));
        assert!(params.contains(&("date".to_string(), "lte.2024-01-31".to_string())));
    }

    #[test]
    fn test_full_encoding() {
        let q = SelectQuery::new()
            .eq("record_id", "abc")
            .ilike("title", "visit")
            .order_by("created_at", SortDirection::Desc)
            .limit(20)
            .offset(40);
        let params = q.to_params();
        assert!(params.contains(&("record_id".to_string(), "eq.abc".to_string())));
        assert!(params.contains(&("title".to_string(), "ilike.*visit*".to_string())));
        assert!(params.contains(&("order".to_string(), "created_at.desc".to_string())));
        assert!(params.contains(&("limit".to_string(), "20".to_string())));
        assert!(params.contains(&("offset".to_string(), "40".to_string())));
    }

    #[test]
    fn test_ilike_escapes_wildcards() {
        let params = SelectQuery::new().ilike("title", "50%_off*").to_params();
        assert!(params.contains(&("title".to_string(), r"ilike.*50\%\_off*".to_string())));
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_sort_direction_from_param() {
        assert_eq!(SortDirection::from_param("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param("whatever"), SortDirection::Desc);
    }
}
