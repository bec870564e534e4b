//! Scroll position and block windowing.
//!
//! The [`Viewport`] maps a scroll offset onto the range of row blocks that
//! must be rendered, and answers the view-position questions navigation
//! needs (which rows are fully visible, where to scroll to show a row).
//!
//! Layout of the scrollable content:
//!
//! ```text
//! content y = 0                      lead = breadcrumb_height - content_origin_y
//! content y = lead + i * row_height  top of row i
//! ```
//!
//! The breadcrumb is pinned over the top `breadcrumb_height` units of the
//! viewport, so at scroll offset `0` the first row sits just below it.
//!
//! # Example
//!
//! ```
//! use outliner::viewport::Viewport;
//!
//! let mut vp = Viewport::new(20, 1, 50);
//! vp.set_visible_count(1_000);
//! vp.scroll_row_to_top(500);
//! let range = vp.block_range().unwrap();
//! assert_eq!((range.first(), range.last()), (10, 10));
//! ```

use std::ops::RangeInclusive;

/// Default number of rows per block.
pub const DEFAULT_BLOCK_SIZE: usize = 50;

/// Inclusive range of block indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    first: usize,
    last: usize,
}

impl BlockRange {
    /// # Panics
    ///
    /// Debug builds assert `first <= last`.
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "inverted block range {first}..={last}");
        Self { first, last }
    }

    pub const fn first(&self) -> usize {
        self.first
    }

    pub const fn last(&self) -> usize {
        self.last
    }

    pub const fn contains(&self, block: usize) -> bool {
        block >= self.first && block <= self.last
    }

    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub const fn iter(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Visible window of the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    scroll_offset: u64,
    height: u32,
    breadcrumb_height: u32,
    content_origin_y: u32,
    row_height: u32,
    block_size: usize,
    visible_count: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 1, DEFAULT_BLOCK_SIZE)
    }
}

impl Viewport {
    /// Create a viewport `height` units tall over rows of `row_height`.
    ///
    /// Zero row heights and block sizes are raised to one.
    pub fn new(height: u32, row_height: u32, block_size: usize) -> Self {
        Self {
            scroll_offset: 0,
            height,
            breadcrumb_height: 0,
            content_origin_y: 0,
            row_height: row_height.max(1),
            block_size: block_size.max(1),
            visible_count: 0,
        }
    }

    pub const fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn breadcrumb_height(&self) -> u32 {
        self.breadcrumb_height
    }

    pub const fn row_height(&self) -> u32 {
        self.row_height
    }

    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    pub const fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Number of blocks covering all visible rows.
    pub const fn total_blocks(&self) -> usize {
        self.visible_count.div_ceil(self.block_size)
    }

    /// Block holding row `index`.
    pub const fn block_of(&self, index: usize) -> usize {
        index / self.block_size
    }

    /// Vertical lead of the rows inside the scrollable content.
    pub fn row_shift(&self) -> i64 {
        i64::from(self.breadcrumb_height) - i64::from(self.content_origin_y)
    }

    /// Content y of the top of row `index`.
    pub fn row_y(&self, index: usize) -> i64 {
        self.row_shift() + to_i64(index) * i64::from(self.row_height)
    }

    /// Viewport y of the top of row `index` at the current scroll offset.
    pub fn row_screen_y(&self, index: usize) -> i64 {
        self.row_y(index) - to_i64_u(self.scroll_offset)
    }

    /// Total height of the scrollable content.
    pub fn content_height(&self) -> u64 {
        u64::try_from(self.row_y(self.visible_count)).unwrap_or(0)
    }

    pub fn max_scroll(&self) -> u64 {
        self.content_height().saturating_sub(u64::from(self.height))
    }

    /// Rows that fit below the breadcrumb.
    pub fn rows_per_page(&self) -> usize {
        let usable = self.height.saturating_sub(self.breadcrumb_height);
        usize::try_from(usable / self.row_height).unwrap_or(usize::MAX).max(1)
    }

    /// Inclusive range of blocks intersecting the viewport, `None` when there are no rows.
    pub fn block_range(&self) -> Option<BlockRange> {
        if self.visible_count == 0 {
            return None;
        }
        let adjusted = (to_i64_u(self.scroll_offset) - self.row_shift()).max(0);
        let block_height = to_i64(self.block_size) * i64::from(self.row_height);
        let last_block = self.total_blocks() - 1;
        let first = to_usize(adjusted / block_height).min(last_block);
        let last = to_usize((adjusted + i64::from(self.height)) / block_height).min(last_block);
        Some(BlockRange::new(first, last))
    }

    /// Row indices covered by `range`, clamped to the visible count.
    pub fn rows_of(&self, range: BlockRange) -> std::ops::Range<usize> {
        let start = (range.first * self.block_size).min(self.visible_count);
        let end = ((range.last + 1) * self.block_size).min(self.visible_count);
        start..end
    }

    /// Index of the row at the top of the area below the breadcrumb.
    pub fn first_visible_row(&self) -> Option<usize> {
        if self.visible_count == 0 {
            return None;
        }
        let top = to_i64_u(self.scroll_offset) + i64::from(self.breadcrumb_height);
        Some(self.row_at(top))
    }

    /// Index of the row at the bottom edge of the viewport.
    pub fn last_visible_row(&self) -> Option<usize> {
        if self.visible_count == 0 {
            return None;
        }
        let bottom = to_i64_u(self.scroll_offset) + i64::from(self.height) - 1;
        Some(self.row_at(bottom))
    }

    /// Whether row `index` lies entirely between the breadcrumb and the bottom edge.
    pub fn is_row_fully_visible(&self, index: usize) -> bool {
        if index >= self.visible_count {
            return false;
        }
        let top = self.row_screen_y(index);
        top >= i64::from(self.breadcrumb_height)
            && top + i64::from(self.row_height) <= i64::from(self.height)
    }

    /// First fully visible row, if any.
    pub fn first_fully_visible_row(&self) -> Option<usize> {
        let first = self.first_visible_row()?;
        [first, first + 1]
            .into_iter()
            .find(|index| self.is_row_fully_visible(*index))
    }

    /// Last fully visible row, if any.
    pub fn last_fully_visible_row(&self) -> Option<usize> {
        let last = self.last_visible_row()?;
        [Some(last), last.checked_sub(1)]
            .into_iter()
            .flatten()
            .find(|index| self.is_row_fully_visible(*index))
    }

    /// Scroll offset that shows row `index` directly below the breadcrumb.
    pub fn offset_for_row_at_top(&self, index: usize) -> u64 {
        let index = self.clamp_row(index);
        let target = self.row_y(index) - i64::from(self.breadcrumb_height);
        self.clamp_offset(target)
    }

    /// Scroll offset that shows row `index` at the bottom edge.
    pub fn offset_for_row_at_bottom(&self, index: usize) -> u64 {
        let index = self.clamp_row(index);
        let target = self.row_y(index) + i64::from(self.row_height) - i64::from(self.height);
        self.clamp_offset(target)
    }

    /// Smallest scroll change that makes row `index` fully visible, if one is needed.
    pub fn offset_to_reveal(&self, index: usize) -> Option<u64> {
        if self.visible_count == 0 || self.is_row_fully_visible(index) {
            return None;
        }
        let index = self.clamp_row(index);
        let offset = if self.row_screen_y(index) < i64::from(self.breadcrumb_height) {
            self.offset_for_row_at_top(index)
        } else {
            self.offset_for_row_at_bottom(index)
        };
        (offset != self.scroll_offset).then_some(offset)
    }

    pub fn scroll_to(&mut self, offset: u64) {
        self.scroll_offset = offset.min(self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let target = to_i64_u(self.scroll_offset).saturating_add(delta);
        self.scroll_offset = self.clamp_offset(target);
    }

    pub fn scroll_row_to_top(&mut self, index: usize) {
        self.scroll_offset = self.offset_for_row_at_top(index);
    }

    pub fn scroll_row_to_bottom(&mut self, index: usize) {
        self.scroll_offset = self.offset_for_row_at_bottom(index);
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        self.clamp_scroll();
    }

    pub fn set_visible_count(&mut self, count: usize) {
        self.visible_count = count;
        self.clamp_scroll();
    }

    pub fn set_breadcrumb_height(&mut self, height: u32) {
        self.breadcrumb_height = height;
        self.clamp_scroll();
    }

    pub fn set_row_height(&mut self, row_height: u32) {
        self.row_height = row_height.max(1);
        self.clamp_scroll();
    }

    pub fn set_content_origin_y(&mut self, origin: u32) {
        self.content_origin_y = origin;
        self.clamp_scroll();
    }

    pub fn set_block_size(&mut self, block_size: usize) {
        self.block_size = block_size.max(1);
    }

    /// A copy of this viewport with a different breadcrumb height, for prediction.
    #[must_use]
    pub fn with_breadcrumb_height(mut self, height: u32) -> Self {
        self.set_breadcrumb_height(height);
        self
    }

    /// Row under viewport y `y`, if any. The breadcrumb area has no rows.
    pub fn row_at_screen_y(&self, y: u32) -> Option<usize> {
        if y < self.breadcrumb_height || y >= self.height {
            return None;
        }
        let content_y = to_i64_u(self.scroll_offset) + i64::from(y) - self.row_shift();
        let index = to_usize(content_y.div_euclid(i64::from(self.row_height)));
        (content_y >= 0 && index < self.visible_count).then_some(index)
    }

    fn row_at(&self, y: i64) -> usize {
        let row = (y - self.row_shift()).max(0) / i64::from(self.row_height);
        self.clamp_row(to_usize(row))
    }

    fn clamp_row(&self, index: usize) -> usize {
        index.min(self.visible_count.saturating_sub(1))
    }

    fn clamp_offset(&self, target: i64) -> u64 {
        u64::try_from(target.max(0)).unwrap_or(0).min(self.max_scroll())
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_i64_u(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}
