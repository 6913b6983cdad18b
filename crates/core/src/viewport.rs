use std::ops::Range;

/// Lines taken by the panel border and title row.
pub const CHROME_LINES: u16 = 3;

/// Scroll window over the visible rows of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    width: u16,
    height: u16,
    scroll_offset: usize,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            scroll_offset: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Rows available for tree lines; never less than one.
    #[must_use]
    pub fn visible_height(&self) -> usize {
        usize::from(self.height.saturating_sub(CHROME_LINES)).max(1)
    }

    #[must_use]
    pub fn visible_range(&self) -> Range<usize> {
        self.scroll_offset..self.scroll_offset + self.visible_height()
    }

    /// Scrolls just enough for the zero-based `cursor_row` to be on screen.
    pub fn adjust_scroll_to_cursor(&mut self, cursor_row: usize) {
        let height = self.visible_height();
        if cursor_row < self.scroll_offset {
            self.scroll_offset = cursor_row;
        } else if cursor_row >= self.scroll_offset + height {
            self.scroll_offset = cursor_row + 1 - height;
        }
    }

    /// Pulls the window back when the content shrank below it.
    pub fn clamp_to(&mut self, total_rows: usize) {
        let max_offset = total_rows.saturating_sub(self.visible_height());
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::Viewport;

    #[test]
    fn visible_height_reserves_chrome_and_never_hits_zero() {
        assert_eq!(Viewport::new(80, 20).visible_height(), 17);
        assert_eq!(Viewport::new(80, 2).visible_height(), 1);
    }

    #[test]
    fn scrolls_down_so_cursor_is_last_visible_line() {
        let mut viewport = Viewport::new(80, 8);
        viewport.adjust_scroll_to_cursor(4);
        assert_eq!(viewport.scroll_offset(), 0);

        viewport.adjust_scroll_to_cursor(5);
        assert_eq!(viewport.scroll_offset(), 1);
        assert_eq!(viewport.visible_range(), 1..6);

        viewport.adjust_scroll_to_cursor(12);
        assert_eq!(viewport.scroll_offset(), 8);
    }

    #[test]
    fn scrolls_up_to_exactly_the_cursor_line() {
        let mut viewport = Viewport::new(80, 8);
        viewport.adjust_scroll_to_cursor(20);
        viewport.adjust_scroll_to_cursor(10);
        assert_eq!(viewport.scroll_offset(), 10);
        viewport.adjust_scroll_to_cursor(0);
        assert_eq!(viewport.scroll_offset(), 0);
    }

    #[test]
    fn clamp_to_removes_trailing_blank_space() {
        let mut viewport = Viewport::new(80, 8);
        viewport.adjust_scroll_to_cursor(30);
        viewport.clamp_to(12);
        assert_eq!(viewport.scroll_offset(), 7);
        viewport.clamp_to(3);
        assert_eq!(viewport.scroll_offset(), 0);
    }

    proptest! {
        #[test]
        fn cursor_is_always_inside_window(height in 0u16..40, rows in proptest::collection::vec(0usize..200, 1..30)) {
            let mut viewport = Viewport::new(80, height);
            for row in rows {
                viewport.adjust_scroll_to_cursor(row);
                prop_assert!(viewport.visible_range().contains(&row));
            }
        }
    }
}
