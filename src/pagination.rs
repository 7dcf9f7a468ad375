use serde::Serialize;
use std::ops::Range;

/// How the derived rows are cut down for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Classic page slicing.
    Paginated,
    /// Only rows near the scroll viewport; the page is ignored.
    Virtual,
    /// Every derived row.
    All,
}

/// 1-based page cursor over a derived row count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Pagination {
    /// A zero page size is treated as one row per page.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(row_count / page_size)`; zero rows means zero pages.
    pub fn total_pages(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size)
    }

    /// Move to `requested`, clamped into `[1, total_pages]` (or 1 with no pages).
    ///
    /// Returns the page actually landed on.
    pub fn go_to(&mut self, requested: i64, row_count: usize) -> usize {
        let last = self.total_pages(row_count).max(1) as i64;
        self.page = requested.clamp(1, last) as usize;
        self.page
    }

    /// Parse and navigate. Anything that is not an integer lands on page 1.
    pub fn go_to_str(&mut self, requested: &str, row_count: usize) -> usize {
        let requested = requested.trim().parse::<i64>().unwrap_or(1);
        self.go_to(requested, row_count)
    }

    pub fn next(&mut self, row_count: usize) -> usize {
        self.go_to(self.page as i64 + 1, row_count)
    }

    pub fn previous(&mut self, row_count: usize) -> usize {
        self.go_to(self.page as i64 - 1, row_count)
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Re-apply the clamp after the row count changed underneath the cursor.
    pub fn clamp(&mut self, row_count: usize) {
        self.go_to(self.page as i64, row_count);
    }

    /// Index range of the current page: `[(page-1)*size, page*size)`,
    /// cut to `row_count`.
    pub fn slice_range(&self, row_count: usize) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(row_count);
        let end = (self.page * self.page_size).min(row_count);
        start..end
    }
}

/// Last known scroll position and height of the scroll container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub client_height: f64,
}

/// Rows to mount in virtual-scroll mode.
///
/// The spacer is `total_height` tall so the scrollbar matches the full row
/// count; the mounted block is translated down by `offset_y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualWindow {
    pub start: usize,
    pub end: usize,
    pub offset_y: f64,
    pub total_height: f64,
}

impl VirtualWindow {
    /// Compute the window for `row_count` rows of fixed `item_height`.
    ///
    /// # Arguments
    /// * `row_count` - Number of derived rows
    /// * `item_height` - Pixel height of one row
    /// * `viewport` - Current scroll offset and container height
    /// * `buffer` - Extra rows mounted above and below the viewport
    ///
    /// # Examples
    /// ```
    /// use datatable::pagination::{Viewport, VirtualWindow};
    ///
    /// let viewport = Viewport { scroll_top: 1000.0, client_height: 500.0 };
    /// let window = VirtualWindow::compute(1000, 50.0, viewport, 5);
    /// assert_eq!((window.start, window.end), (15, 35));
    /// assert_eq!(window.offset_y, 750.0);
    /// assert_eq!(window.total_height, 50000.0);
    /// ```
    pub fn compute(row_count: usize, item_height: f64, viewport: Viewport, buffer: usize) -> Self {
        let total_height = row_count as f64 * item_height;
        if row_count == 0 || !(item_height > 0.0 && item_height.is_finite()) {
            return Self {
                start: 0,
                end: 0,
                offset_y: 0.0,
                total_height: if total_height.is_finite() { total_height.max(0.0) } else { 0.0 },
            };
        }

        let scroll_top = viewport.scroll_top.max(0.0);
        let client_height = viewport.client_height.max(0.0);

        // Float-to-int casts saturate, so huge or infinite offsets land past the end
        let first_visible = (scroll_top / item_height).floor() as usize;
        let last_visible = ((scroll_top + client_height) / item_height).ceil() as usize;

        let start = first_visible.saturating_sub(buffer).min(row_count);
        let end = last_visible.saturating_add(buffer).min(row_count).max(start);

        Self {
            start,
            end,
            offset_y: start as f64 * item_height,
            total_height,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
