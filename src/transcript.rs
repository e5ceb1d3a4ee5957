//! The visible transcript and its scroll position.
//!
//! Scroll position is normalised the way the host's scroll view reports it:
//! `0.0` is the bottom (newest output), `1.0` the top. Content height is
//! estimated from the number of lines in the text.

use crate::config::ScrollConfig;

#[derive(Debug, Clone)]
pub struct Transcript {
    text: String,
    scroll: f32,
    metrics: ScrollConfig,
}

impl Transcript {
    pub fn new(metrics: ScrollConfig) -> Self {
        Self {
            text: String::new(),
            scroll: 0.0,
            metrics,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn scroll_position(&self) -> f32 {
        self.scroll
    }

    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.text.matches('\n').count() + 1
        }
    }

    pub fn content_height(&self) -> f32 {
        self.line_count() as f32 * self.metrics.line_height
    }

    /// Append committed output, then reconcile the scroll position so a view
    /// near the bottom follows new output and any other view keeps showing the
    /// same content.
    pub fn append(&mut self, text: &str) {
        let old_range = self.scroll_range();
        let pos = self.scroll;
        self.text.push_str(text);
        let new_range = self.scroll_range();

        let offset = pos * old_range;
        self.scroll = if offset < self.metrics.snap_distance || new_range <= 0.0 {
            0.0
        } else {
            ((offset + (new_range - old_range)) / new_range).clamp(0.0, 1.0)
        };
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.scroll = 0.0;
    }

    pub fn pin_to_bottom(&mut self) {
        self.scroll = 0.0;
    }

    /// Scroll by `lines`; positive values move toward older output.
    pub fn scroll_by(&mut self, lines: f32) {
        let range = self.scroll_range();
        if range <= 0.0 {
            self.scroll = 0.0;
            return;
        }
        let delta = lines * self.metrics.line_height / range;
        self.scroll = (self.scroll + delta).clamp(0.0, 1.0);
    }

    /// Height of content hidden outside the viewport.
    fn scroll_range(&self) -> f32 {
        self.content_height() - self.metrics.viewport_height
    }
}
