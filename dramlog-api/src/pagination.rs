//! Pagination for list endpoints
//!
//! Lists are addressed by 1-indexed `page` and `perPage` query parameters
//! and returned with enough metadata for a client to walk every page.

use serde::{Deserialize, Serialize};

/// Page size used when the client does not ask for one
pub const DEFAULT_PER_PAGE: i64 = 25;

/// Largest page a client may request
pub const MAX_PER_PAGE: i64 = 100;

/// `?page=&perPage=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub per_page: i64,
    /// Total number of pages
    pub total_pages: i64,
    pub total_results: i64,
    /// Offset for SQL LIMIT/OFFSET query
    #[serde(skip)]
    pub offset: i64,
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    pub pagination: Pagination,
}

/// Calculate pagination metadata from total results and the requested page
///
/// The page is clamped to `[1, total_pages]` and the page size to
/// `[1, MAX_PER_PAGE]`.
///
/// # Examples
/// ```
/// use dramlog_api::pagination::{calculate_pagination, PageQuery};
///
/// // 60 results at 25 per page = 3 pages (25 + 25 + 10)
/// let p = calculate_pagination(60, PageQuery { page: Some(2), per_page: None });
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 25);
///
/// // Out-of-bounds page gets clamped
/// let p = calculate_pagination(60, PageQuery { page: Some(99), per_page: None });
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: i64, query: PageQuery) -> Pagination {
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let total_pages = (total_results + per_page - 1) / per_page;
    let page = query.page.unwrap_or(1).max(1).min(total_pages.max(1));
    let offset = (page - 1) * per_page;

    Pagination {
        page,
        per_page,
        total_pages,
        total_results,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: i64) -> PageQuery {
        PageQuery {
            page: Some(page),
            per_page: None,
        }
    }

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(60, query(2));
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 25);
    }

    #[test]
    fn test_pagination_defaults() {
        let p = calculate_pagination(10, PageQuery::default());
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, DEFAULT_PER_PAGE);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_out_of_bounds() {
        let p = calculate_pagination(30, query(99));
        assert_eq!(p.page, 2);
        assert_eq!(p.offset, 25);

        let p = calculate_pagination(30, query(0));
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_per_page_clamped() {
        let p = calculate_pagination(
            500,
            PageQuery {
                page: Some(1),
                per_page: Some(1000),
            },
        );
        assert_eq!(p.per_page, MAX_PER_PAGE);
        assert_eq!(p.total_pages, 5);

        let p = calculate_pagination(
            5,
            PageQuery {
                page: None,
                per_page: Some(0),
            },
        );
        assert_eq!(p.per_page, 1);
        assert_eq!(p.total_pages, 5);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, query(1));
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }
}
