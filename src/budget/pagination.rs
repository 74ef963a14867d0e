//! "Show more" / "show less" paging over category rows.

/// Rows added per "show more".
pub const PAGE_SIZE: usize = 5;

/// Visible-row limit for the category list.
///
/// # Invariants
/// - `limit >= page_size`
/// - The limit only grows while rows are hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPager {
    limit: usize,
    page_size: usize,
}

impl Default for CategoryPager {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl CategoryPager {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            limit: page_size,
            page_size,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Rows actually shown out of `total`.
    pub fn shown(&self, total: usize) -> usize {
        self.limit.min(total)
    }

    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.shown(items.len())]
    }

    pub fn can_show_more(&self, total: usize) -> bool {
        total > self.limit
    }

    pub fn can_show_less(&self) -> bool {
        self.limit > self.page_size
    }

    /// Reveal another page. Returns false when everything is already visible.
    pub fn show_more(&mut self, total: usize) -> bool {
        if !self.can_show_more(total) {
            return false;
        }
        self.limit += self.page_size;
        true
    }

    pub fn show_less(&mut self) {
        self.limit = self.page_size;
    }
}
