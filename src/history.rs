//! Command history with a recall cursor.
//!
//! Entries are stored newest first. The cursor is `None` while the user is
//! editing a fresh line and `Some(i)` while entry `i` is recalled.

/// Direction of a recall step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward older entries.
    Up,
    /// Toward newer entries and finally the live line.
    Down,
}

#[derive(Debug, Default, Clone)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `command` as the newest entry. Blank commands are skipped.
    ///
    /// History is unbounded and keeps duplicates.
    pub fn record(&mut self, command: &str) {
        if command.trim().is_empty() {
            return;
        }
        self.entries.insert(0, command.to_string());
    }

    pub fn reset(&mut self) {
        self.cursor = None;
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Move the cursor one step and return the text the input should show.
    ///
    /// Returns `None` when nothing changes: the history is empty, or the live
    /// line spans several lines and would be lost by recalling an entry.
    /// Stepping below the newest entry returns to the live line with an empty
    /// input.
    pub fn navigate(&mut self, direction: Direction, live_line_count: usize) -> Option<String> {
        if self.entries.is_empty() || (self.cursor.is_none() && live_line_count > 1) {
            return None;
        }

        let current = self.cursor.map_or(-1, |c| c as isize);
        let next = match direction {
            Direction::Up => current + 1,
            Direction::Down => current - 1,
        };

        if next < 0 {
            self.cursor = None;
            return Some(String::new());
        }

        let index = (next as usize).min(self.entries.len() - 1);
        self.cursor = Some(index);
        Some(self.entries[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(commands: &[&str]) -> CommandHistory {
        let mut h = CommandHistory::new();
        for c in commands {
            h.record(c);
        }
        h
    }

    #[test]
    fn record_prepends() {
        let h = history(&["a", "b"]);
        assert_eq!(h.entries(), ["b", "a"]);
    }

    #[test]
    fn blank_commands_are_not_recorded() {
        let h = history(&["", "   ", "\n"]);
        assert!(h.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let h = history(&["x", "x"]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn navigate_empty_is_noop() {
        let mut h = CommandHistory::new();
        assert_eq!(h.navigate(Direction::Up, 1), None);
        assert_eq!(h.cursor(), None);
    }

    #[test]
    fn up_from_live_selects_newest() {
        let mut h = history(&["old", "new"]);
        assert_eq!(h.navigate(Direction::Up, 1).as_deref(), Some("new"));
        assert_eq!(h.cursor(), Some(0));
    }

    #[test]
    fn up_clamps_at_oldest() {
        let mut h = history(&["old", "new"]);
        h.navigate(Direction::Up, 1);
        h.navigate(Direction::Up, 1);
        assert_eq!(h.navigate(Direction::Up, 1).as_deref(), Some("old"));
        assert_eq!(h.cursor(), Some(1));
    }

    #[test]
    fn up_n_then_down_n_plus_one_returns_to_live() {
        let mut h = history(&["a", "b", "c"]);
        for _ in 0..3 {
            h.navigate(Direction::Up, 1);
        }
        let mut last = None;
        for _ in 0..4 {
            last = h.navigate(Direction::Down, 1);
        }
        assert_eq!(h.cursor(), None);
        assert_eq!(last.as_deref(), Some(""));
    }

    #[test]
    fn down_from_live_clears_input() {
        let mut h = history(&["a"]);
        assert_eq!(h.navigate(Direction::Down, 1).as_deref(), Some(""));
        assert_eq!(h.cursor(), None);
    }

    #[test]
    fn multiline_live_edit_is_protected() {
        let mut h = history(&["a"]);
        assert_eq!(h.navigate(Direction::Up, 3), None);
        assert_eq!(h.cursor(), None);

        // Once an entry is recalled the guard no longer applies.
        h.navigate(Direction::Up, 1);
        assert_eq!(h.navigate(Direction::Down, 3).as_deref(), Some(""));
    }

    #[test]
    fn reset_returns_to_live() {
        let mut h = history(&["a"]);
        h.navigate(Direction::Up, 1);
        h.reset();
        assert_eq!(h.cursor(), None);
    }
}
