//! Pagination and sorting for list queries

use crate::filter::FilterCriteria;
use crate::proto;

/// Page used when the request omits one or sends a non-positive value
pub const DEFAULT_PAGE: i32 = 1;
/// Page size used when the request omits one or sends a non-positive value
pub const DEFAULT_PAGE_SIZE: i32 = 10;
/// Column sorted on when the request does not name one
pub const DEFAULT_SORT_BY: &str = "created_at";

/// Audit columns every generated table carries; always valid sort keys
pub const AUDIT_COLUMNS: [&str; 5] = ["id", "created_at", "updated_at", "created_by", "updated_by"];

/// Resolved pagination for one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// One-based page number
    pub page: i32,
    /// Rows per page
    pub page_size: i32,
    /// Requested sort column, whitelisted when the query runs
    pub sort_by: String,
    /// Sort `DESC` instead of `ASC`
    pub descending: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            descending: true,
        }
    }
}

impl Pagination {
    /// Resolve defaults from the wire message
    ///
    /// When a pagination message is present its `descending` flag is taken
    /// verbatim; only an absent message falls back to descending order.
    pub fn resolve(wire: Option<&proto::Pagination>) -> Self {
        let Some(wire) = wire else {
            return Self::default();
        };

        Self {
            page: if wire.page > 0 { wire.page } else { DEFAULT_PAGE },
            page_size: if wire.page_size > 0 {
                wire.page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
            sort_by: if wire.sort_by.is_empty() {
                DEFAULT_SORT_BY.to_string()
            } else {
                wire.sort_by.clone()
            },
            descending: wire.descending,
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    /// `ASC` or `DESC`
    pub fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }

    /// The sort column, restricted to the whitelist plus the audit columns
    ///
    /// Anything else falls back to [`DEFAULT_SORT_BY`] rather than reaching the
    /// `ORDER BY` clause.
    pub fn sort_column<'a>(&'a self, whitelist: &[&str]) -> &'a str {
        let requested = self.sort_by.as_str();
        if whitelist.contains(&requested) || AUDIT_COLUMNS.contains(&requested) {
            requested
        } else {
            tracing::debug!(sort_by = requested, "sort column not whitelisted, using default");
            DEFAULT_SORT_BY
        }
    }
}

/// A list request: filter tree plus resolved pagination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Filter tree, compiled against the entity's whitelist
    pub filters: Vec<FilterCriteria>,
    /// Resolved pagination
    pub pagination: Pagination,
}

impl ListQuery {
    /// Build from the optional wire search message carried by list requests
    pub fn from_search(search: Option<proto::SearchRequest>) -> Self {
        match search {
            Some(search) => {
                let pagination = Pagination::resolve(search.pagination.as_ref());
                Self {
                    filters: search
                        .filters
                        .into_iter()
                        .filter_map(FilterCriteria::from_proto)
                        .collect(),
                    pagination,
                }
            }
            None => Self::default(),
        }
    }
}

impl From<proto::SearchRequest> for ListQuery {
    fn from(search: proto::SearchRequest) -> Self {
        Self::from_search(Some(search))
    }
}

/// One page of list results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Rows of this page
    pub items: Vec<T>,
    /// Matching rows across all pages
    pub total: i64,
    /// One-based page number
    pub page: i32,
    /// Rows per page
    pub page_size: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_pagination() {
        let pagination = Pagination::resolve(None);
        assert_eq!(pagination, Pagination::default());
        assert_eq!(pagination.offset(), 0);
        assert_eq!(pagination.direction(), "DESC");
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let wire = proto::Pagination {
            page: 0,
            page_size: -5,
            sort_by: String::new(),
            descending: false,
        };
        let pagination = Pagination::resolve(Some(&wire));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.page_size, 10);
        assert_eq!(pagination.sort_by, "created_at");
        assert_eq!(pagination.direction(), "ASC");
    }

    #[test]
    fn test_offset() {
        let wire = proto::Pagination {
            page: 3,
            page_size: 25,
            sort_by: "name".to_string(),
            descending: true,
        };
        assert_eq!(Pagination::resolve(Some(&wire)).offset(), 50);
    }

    #[test]
    fn test_sort_column_whitelist() {
        let mut pagination = Pagination {
            sort_by: "name".to_string(),
            ..Default::default()
        };
        assert_eq!(pagination.sort_column(&["name"]), "name");
        assert_eq!(pagination.sort_column(&["status"]), "created_at");

        pagination.sort_by = "updated_at".to_string();
        assert_eq!(pagination.sort_column(&[]), "updated_at");

        pagination.sort_by = "name; DROP TABLE users".to_string();
        assert_eq!(pagination.sort_column(&["name"]), "created_at");
    }

    #[test]
    fn test_list_query_from_search() {
        let search = proto::SearchRequest {
            filters: vec![proto::FilterCriteria { criteria: None }],
            pagination: Some(proto::Pagination {
                page: 2,
                page_size: 5,
                sort_by: String::new(),
                descending: false,
            }),
        };
        let query = ListQuery::from(search);
        assert!(query.filters.is_empty());
        assert_eq!(query.pagination.page, 2);
        assert_eq!(query.pagination.offset(), 5);
        assert_eq!(ListQuery::from_search(None), ListQuery::default());
    }
}
