//! Pagination parameters shared by every listing endpoint

use serde::{Deserialize, Serialize};

/// Page size used when the requested one is missing or out of range
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw `?page=&page_size=` query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Normalized, 1-indexed pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Clamp raw values: `page < 1` becomes 1, a page size outside
    /// `[1, MAX_PAGE_SIZE]` becomes [`DEFAULT_PAGE_SIZE`].
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = if page < 1 { 1 } else { page.min(u32::MAX as i64) as u32 };
        let page_size = if (1..=MAX_PAGE_SIZE as i64).contains(&page_size) {
            page_size as u32
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self { page, page_size }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// `ceil(total / page_size)`
    pub fn total_pages(&self, total: u64) -> u32 {
        total.div_ceil(self.page_size as u64) as u32
    }
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        Self::new(q.page.unwrap_or(1), q.page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamped_to_one() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(-5, 10).page, 1);
        assert_eq!(Pagination::new(3, 10).page, 3);
    }

    #[test]
    fn test_page_size_out_of_range_uses_default() {
        assert_eq!(Pagination::new(1, 0).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(1, -1).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(1, 101).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(1, 100).page_size, 100);
        assert_eq!(Pagination::new(1, 1).page_size, 1);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
        assert_eq!(p.total_pages(25), 3);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_from_query_defaults() {
        let p = Pagination::from(PageQuery::default());
        assert_eq!(p, Pagination { page: 1, page_size: DEFAULT_PAGE_SIZE });
    }
}
