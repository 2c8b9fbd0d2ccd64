//! Page arithmetic for item listings

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    #[serde(skip)]
    pub offset: i64,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Calculate pagination metadata, clamping the requested page to
/// `[1, total_pages]`
///
/// A non-positive `page_size` is treated as 1.
///
/// ```
/// use catalog_server::pagination::calculate_pagination;
///
/// let p = calculate_pagination(30, 12, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 12);
///
/// // Past the end lands on the last page
/// let p = calculate_pagination(30, 12, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 24);
/// ```
pub fn calculate_pagination(total_results: i64, page_size: i64, requested_page: i64) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = (total_results.max(0) + page_size - 1) / page_size;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(30, 12, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 12);
        assert!(p.has_next());
        assert!(p.has_previous());
    }

    #[test]
    fn test_pagination_out_of_bounds_high() {
        let p = calculate_pagination(13, 12, 99);
        assert_eq!(p.page, 2);
        assert_eq!(p.offset, 12);
        assert!(!p.has_next());
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(13, 12, -4);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
        assert!(!p.has_previous());
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 12, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_boundary() {
        let p = calculate_pagination(24, 12, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 12);
    }

    #[test]
    fn test_zero_page_size_treated_as_one() {
        let p = calculate_pagination(3, 0, 2);
        assert_eq!(p.page_size, 1);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 1);
    }
}
