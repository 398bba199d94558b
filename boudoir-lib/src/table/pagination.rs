//! Pagination state.

use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

/// Neighbouring pages shown on each side of the current page.
const WINDOW_NEIGHBORS: u32 = 2;

/// One entry of the rendered page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// A clickable page number.
    Page(u32),
    /// A collapsed gap between two page numbers.
    Ellipsis,
}

/// Tracks the current page against a total item count.
///
/// `total_pages`, `has_next` and `has_previous` are derived from the three
/// stored fields. The current page always stays within
/// `1..=max(1, total_pages)`.
///
/// # Example
///
/// ```
/// use boudoir_lib::table::Pagination;
///
/// let mut pagination = Pagination::new(10);
/// pagination.set_total_items(27);
/// assert_eq!(pagination.total_pages(), 3);
///
/// assert!(!pagination.set_page(4));
/// assert!(pagination.set_page(3));
/// assert!(!pagination.has_next());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    current_page: u32,
    page_size: u32,
    total_items: u64,
    /// Page changes are ignored while a fetch is in flight.
    #[serde(skip)]
    loading: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Pagination {
    /// Creates pagination on page 1 with no items. A zero size becomes 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
            loading: false,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// `ceil(total_items / page_size)`.
    pub fn total_pages(&self) -> u32 {
        self.total_items.div_ceil(self.page_size as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Moves to page `n`.
    ///
    /// Returns `false` (and changes nothing) when `n` is out of
    /// `1..=total_pages` or a fetch is in flight.
    pub fn set_page(&mut self, n: u32) -> bool {
        if self.loading || n < 1 || n > self.total_pages() {
            return false;
        }
        self.current_page = n;
        true
    }

    /// Moves to the next page, if any.
    pub fn next(&mut self) -> bool {
        self.has_next() && self.set_page(self.current_page + 1)
    }

    /// Moves to the previous page, if any.
    pub fn previous(&mut self) -> bool {
        self.has_previous() && self.set_page(self.current_page - 1)
    }

    /// Changes the page size and always returns to page 1. Zero is ignored.
    pub fn set_page_size(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        self.page_size = n;
        self.current_page = 1;
    }

    /// Updates the item count and clamps the current page into range.
    pub fn set_total_items(&mut self, n: u64) {
        self.total_items = n;
        self.clamp();
    }

    /// Returns to page 1.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn clamp(&mut self) {
        let last = self.total_pages().max(1);
        self.current_page = self.current_page.clamp(1, last);
    }

    /// Index range of the current page within the full item list.
    pub fn range(&self) -> Range<usize> {
        let start = (self.current_page as u64 - 1) * self.page_size as u64;
        let start = start.min(self.total_items);
        let end = (start + self.page_size as u64).min(self.total_items);
        start as usize..end as usize
    }

    /// `(first, last, total)` for a "showing X–Y of Z" line, 1-based.
    pub fn summary(&self) -> (u64, u64, u64) {
        let range = self.range();
        if range.is_empty() {
            return (0, 0, self.total_items);
        }
        (range.start as u64 + 1, range.end as u64, self.total_items)
    }

    /// Page-number strip: first, last, and two neighbours around the
    /// current page, with an ellipsis for each gap.
    pub fn window(&self) -> Vec<PageItem> {
        let last = self.total_pages().max(1);
        let low = self.current_page.saturating_sub(WINDOW_NEIGHBORS).max(1);
        let high = (self.current_page + WINDOW_NEIGHBORS).min(last);

        let mut pages: Vec<u32> = Vec::with_capacity((high - low + 3) as usize);
        pages.push(1);
        pages.extend(low..=high);
        pages.push(last);
        pages.sort_unstable();
        pages.dedup();

        let mut items = Vec::with_capacity(pages.len() * 2);
        let mut previous: Option<u32> = None;
        for page in pages {
            if let Some(prev) = previous
                && page > prev + 1
            {
                items.push(PageItem::Ellipsis);
            }
            items.push(PageItem::Page(page));
            previous = Some(page);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginated(page_size: u32, total: u64) -> Pagination {
        let mut p = Pagination::new(page_size);
        p.set_total_items(total);
        p
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for (total, size, expected) in [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (27, 10, 3)] {
            assert_eq!(paginated(size, total).total_pages(), expected);
        }
    }

    #[test]
    fn test_out_of_range_pages_are_rejected() {
        let mut p = paginated(10, 27);
        assert!(p.set_page(3));
        assert!(!p.set_page(4));
        assert_eq!(p.current_page(), 3);
        assert!(!p.set_page(0));
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn test_page_change_ignored_while_loading() {
        let mut p = paginated(10, 100);
        p.set_loading(true);
        assert!(!p.set_page(2));
        assert_eq!(p.current_page(), 1);
        p.set_loading(false);
        assert!(p.set_page(2));
    }

    #[test]
    fn test_page_size_change_resets_to_first_page() {
        let mut p = paginated(10, 100);
        p.set_page(3);
        p.set_page_size(25);
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.total_pages(), 4);
    }

    #[test]
    fn test_shrinking_total_clamps_current_page() {
        let mut p = paginated(10, 100);
        p.set_page(10);
        p.set_total_items(35);
        assert_eq!(p.current_page(), 4);
        p.set_total_items(0);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn test_range_and_summary() {
        let mut p = paginated(10, 27);
        p.set_page(3);
        assert_eq!(p.range(), 20..27);
        assert_eq!(p.summary(), (21, 27, 27));
        assert_eq!(paginated(10, 0).summary(), (0, 0, 0));
    }

    #[test]
    fn test_window_collapses_gaps() {
        let mut p = paginated(10, 200);
        p.set_page(10);
        assert_eq!(
            p.window(),
            vec![
                PageItem::Page(1),
                PageItem::Ellipsis,
                PageItem::Page(8),
                PageItem::Page(9),
                PageItem::Page(10),
                PageItem::Page(11),
                PageItem::Page(12),
                PageItem::Ellipsis,
                PageItem::Page(20),
            ]
        );
    }

    #[test]
    fn test_window_has_no_duplicates_near_edges() {
        let p = paginated(10, 30);
        assert_eq!(
            p.window(),
            vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]
        );
        assert_eq!(paginated(10, 0).window(), vec![PageItem::Page(1)]);
    }
}
