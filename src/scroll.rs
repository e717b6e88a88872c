/// Result of a windowing pass over a fixed-height item list.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollWindow {
    /// Scroll offset clamped to `[0, max_scroll]`.
    pub clamped_scroll: f32,
    /// Total scrollable extent: `item_height * count`.
    pub max_scroll: f32,
    /// Index of the first item to render.
    pub start_index: usize,
    /// Number of items fully fitting in the frame from `start_index`.
    pub visible_count: usize,
    item_height: f32,
    count: usize,
}

impl ScrollWindow {
    /// Index range to render: the visible items plus one trailing partial.
    pub fn range(&self) -> std::ops::Range<usize> {
        let end = (self.start_index + self.visible_count + 1).min(self.count);
        self.start_index..end
    }

    /// Spacer height standing in for the items skipped before the window.
    pub fn leading_space(&self) -> f32 {
        self.start_index as f32 * self.item_height
    }

    /// Spacer height after the rendered items so the scrollable extent
    /// stays `max_scroll` regardless of how few items were drawn.
    pub fn trailing_space(&self, rendered_items: usize) -> f32 {
        let used = self.leading_space() + rendered_items as f32 * self.item_height;
        (self.max_scroll - used).max(0.0)
    }
}

/// Compute the visible window for `count` items of uniform `item_height`
/// inside a frame of `frame_height`, at scroll offset `scroll`.
pub fn visible(count: usize, item_height: f32, frame_height: f32, scroll: f32) -> ScrollWindow {
    if count == 0 || item_height <= 0.0 {
        return ScrollWindow::default();
    }
    let max_scroll = item_height * count as f32;
    let clamped_scroll = scroll.clamp(0.0, max_scroll);
    let start_index = ((clamped_scroll / item_height).floor() as usize).min(count - 1);
    let fitting = (frame_height.max(0.0) / item_height).floor() as usize;
    let visible_count = fitting.min(count - start_index);
    ScrollWindow {
        clamped_scroll,
        max_scroll,
        start_index,
        visible_count,
        item_height,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_yields_default() {
        let w = visible(0, 20.0, 100.0, 50.0);
        assert_eq!(w.start_index, 0);
        assert_eq!(w.visible_count, 0);
        assert_eq!(w.max_scroll, 0.0);
        assert!(w.range().is_empty());
    }

    #[test]
    fn window_stays_in_bounds() {
        // 100 items, 20px each, 90px frame
        let w = visible(100, 20.0, 90.0, 205.0);
        assert_eq!(w.max_scroll, 2000.0);
        assert_eq!(w.clamped_scroll, 205.0);
        assert_eq!(w.start_index, 10);
        assert_eq!(w.visible_count, 4);
        assert_eq!(w.range(), 10..15);
        assert_eq!(w.leading_space(), 200.0);
    }

    #[test]
    fn overscroll_is_clamped() {
        let w = visible(10, 20.0, 100.0, 1e9);
        assert_eq!(w.clamped_scroll, 200.0);
        assert_eq!(w.start_index, 9);
        assert_eq!(w.visible_count, 1);
        assert_eq!(w.range(), 9..10);
    }

    #[test]
    fn negative_scroll_is_clamped() {
        let w = visible(10, 20.0, 100.0, -50.0);
        assert_eq!(w.clamped_scroll, 0.0);
        assert_eq!(w.start_index, 0);
    }

    #[test]
    fn spacers_reconstruct_full_extent() {
        let w = visible(100, 20.0, 90.0, 200.0);
        let rendered = w.range().len();
        let total = w.leading_space() + rendered as f32 * 20.0 + w.trailing_space(rendered);
        assert_eq!(total, w.max_scroll);
    }
}
