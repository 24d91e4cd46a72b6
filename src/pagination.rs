use std::ops::Range;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 9;
pub const DEFAULT_MAX_VISIBLE_PAGES: usize = 5;

/// Page bookkeeping for a list of `total_items`, with 1-based page numbers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    total_items: usize,
    items_per_page: usize,
    current_page: usize,
    max_visible_pages: usize,
}

/// Partial update for [`Pagination::update`]. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationUpdate {
    pub total_items: Option<usize>,
    pub items_per_page: Option<usize>,
    pub current_page: Option<usize>,
}

/// Snapshot of the current page.
///
/// `start` is the 1-based number of the first item on the page and `end` the
/// number of the last, so a page showing items 10 to 18 has `start == 10`
/// and `end == 18`. An empty list gives `start == 1`, `end == 0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageData {
    pub current_page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    pub total_items: usize,
    pub start: usize,
    pub end: usize,
}

impl Pagination {
    /// Start on page 1. A zero `items_per_page` falls back to the default.
    pub fn new(total_items: usize, items_per_page: usize) -> Self {
        Self {
            total_items,
            items_per_page: non_zero_or(items_per_page, DEFAULT_ITEMS_PER_PAGE),
            current_page: 1,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
        }
    }

    pub fn with_max_visible_pages(mut self, max_visible_pages: usize) -> Self {
        self.max_visible_pages = non_zero_or(max_visible_pages, DEFAULT_MAX_VISIBLE_PAGES);
        self
    }

    /// Start on `page`, clamped into range.
    pub fn with_current_page(mut self, page: usize) -> Self {
        self.current_page = page;
        self.clamp_current_page();
        self
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.items_per_page)
    }

    /// A single page (or none) needs no page controls.
    pub fn is_rendered(&self) -> bool {
        self.total_pages() > 1
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Page numbers to show as buttons.
    ///
    /// All pages when they fit in `max_visible_pages`; otherwise a window of
    /// exactly `max_visible_pages` pages, centred on the current page where
    /// possible and pushed back from either end of the range.
    pub fn visible_pages(&self) -> Vec<usize> {
        let total = self.total_pages();
        let max = self.max_visible_pages;
        if total <= max {
            return (1..=total).collect();
        }

        let mut start = self.current_page.saturating_sub(max / 2).max(1);
        let end = (start + max - 1).min(total);
        if end - start < max - 1 {
            start = (end + 1).saturating_sub(max).max(1);
        }
        (start..=end).collect()
    }

    /// Move to `page`. Returns `false`, leaving the state alone, when `page`
    /// is out of range or already current.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages() || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    /// Apply new totals and/or a new page, then clamp the current page into
    /// `[1, total_pages]`.
    pub fn update(&mut self, update: PaginationUpdate) {
        if let Some(total_items) = update.total_items {
            self.total_items = total_items;
        }
        if let Some(items_per_page) = update.items_per_page {
            self.items_per_page = non_zero_or(items_per_page, DEFAULT_ITEMS_PER_PAGE);
        }
        if let Some(page) = update.current_page {
            self.current_page = page;
        }
        self.clamp_current_page();
    }

    pub fn page_data(&self) -> PageData {
        let range = self.item_range();
        PageData {
            current_page: self.current_page,
            total_pages: self.total_pages(),
            items_per_page: self.items_per_page,
            total_items: self.total_items,
            start: range.start + 1,
            end: range.end,
        }
    }

    /// Zero-based index range of the items on the current page.
    pub fn item_range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.items_per_page).min(self.total_items);
        let end = (start + self.items_per_page).min(self.total_items);
        start..end
    }

    fn clamp_current_page(&mut self) {
        self.current_page = self.current_page.min(self.total_pages()).max(1);
    }
}

fn non_zero_or(value: usize, default: usize) -> usize {
    if value == 0 {
        default
    } else {
        value
    }
}
