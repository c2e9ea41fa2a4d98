//! Pagination request and result types.
//!
//! Callers hand over whatever they parsed from a query string. Non-positive
//! values (including the `0` a failed parse usually turns into) fall back to
//! the defaults instead of failing.

use serde::{Deserialize, Serialize};

/// Page used when the requested page is not positive.
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when the requested page size is not positive.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A normalized search + pagination request.
///
/// ```
/// use ecommerce_core::PageRequest;
///
/// let req = PageRequest::new("shoe", -3, 0);
/// assert_eq!(req.page(), 1);
/// assert_eq!(req.page_size(), 10);
/// assert_eq!(req.offset(), 0);
/// ```
///
/// Deserializing goes through [`PageRequest::new`], so query parameters get
/// the same fallbacks:
///
/// ```
/// use ecommerce_core::PageRequest;
///
/// let req: PageRequest = serde_json::from_str(r#"{"page":0,"page_size":-1}"#).unwrap();
/// assert_eq!((req.page(), req.page_size()), (1, 10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    search: String,
    page: u64,
    page_size: u64,
}

/// Wire shape of a [`PageRequest`] before normalization.
#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    search: String,
    #[serde(default)]
    page: i64,
    #[serde(default)]
    page_size: i64,
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.search, raw.page, raw.page_size)
    }
}

impl PageRequest {
    /// Build a request, normalizing `page <= 0` to 1 and `page_size <= 0` to 10.
    #[must_use]
    pub fn new(search: impl Into<String>, page: i64, page_size: i64) -> Self {
        Self {
            search: search.into(),
            page: u64::try_from(page)
                .ok()
                .filter(|p| *p > 0)
                .unwrap_or(DEFAULT_PAGE),
            page_size: u64::try_from(page_size)
                .ok()
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// First page with the default size and no search term.
    #[must_use]
    pub fn first() -> Self {
        Self::new("", 1, 0)
    }

    /// Search term; empty matches everything.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of matching records skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page, in creation order.
    pub items: Vec<T>,
    /// Matches across all pages.
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    /// Assemble a page for `request`.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// Number of pages needed to show every match; zero for a zero page size.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Convert the items, keeping the pagination meta.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_normalizes() {
        let req: PageRequest = serde_json::from_str(r#"{"page":0,"page_size":-1}"#).unwrap();
        assert_eq!(req, PageRequest::new("", 1, 10));
        assert_eq!(req.offset(), 0);

        let req: PageRequest =
            serde_json::from_str(r#"{"search":"mug","page":-4,"page_size":0}"#).unwrap();
        assert_eq!((req.search(), req.page(), req.page_size()), ("mug", 1, 10));

        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, PageRequest::first());
    }

    #[test]
    fn test_serialize_round_trips_normalized_values() {
        let req = PageRequest::new("shoe", 3, 25);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(serde_json::from_str::<PageRequest>(&json).unwrap(), req);
    }

    #[test]
    fn test_total_pages_of_deserialized_zero_size_page() {
        let page: Page<u8> =
            serde_json::from_str(r#"{"items":[],"total":5,"page":1,"page_size":0}"#).unwrap();
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn test_non_positive_values_use_defaults() {
        for page in [0, -1, i64::MIN] {
            assert_eq!(PageRequest::new("", page, 5).page(), DEFAULT_PAGE);
        }
        for size in [0, -10] {
            assert_eq!(PageRequest::new("", 2, size).page_size(), DEFAULT_PAGE_SIZE);
        }
        assert_eq!(PageRequest::new("", 0, 0), PageRequest::new("", 1, 10));
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new("", 1, 10).offset(), 0);
        assert_eq!(PageRequest::new("", 3, 10).offset(), 20);
    }

    #[test]
    fn test_offset_saturates() {
        let req = PageRequest::new("", i64::MAX, i64::MAX);
        assert_eq!(req.offset(), u64::MAX);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new("", 1, 10);
        assert_eq!(Page::<u8>::new(vec![], 25, &req).total_pages(), 3);
        assert_eq!(Page::<u8>::new(vec![], 20, &req).total_pages(), 2);
        assert_eq!(Page::<u8>::new(vec![], 0, &req).total_pages(), 0);
    }

    #[test]
    fn test_map_keeps_meta() {
        let req = PageRequest::new("x", 2, 3);
        let page = Page::new(vec![1, 2], 5, &req).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!((page.total, page.page, page.page_size), (5, 2, 3));
    }
}
