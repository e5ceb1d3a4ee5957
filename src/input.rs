//! Headless state of the console's input field.

/// What Enter does in the input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    /// Enter submits the command.
    #[default]
    MultiLineSubmit,
    /// Enter inserts a newline.
    MultiLineNewline,
}

#[derive(Debug, Clone, Default)]
pub struct InputLine {
    text: String,
    /// Byte offset, always on a char boundary.
    caret: usize,
    focused: bool,
    interactable: bool,
    line_mode: LineMode,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Replace the text and put the caret after it.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.caret = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    // --- Focus ---------------------------------------------------------------

    pub fn activate(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
    }

    pub fn is_interactable(&self) -> bool {
        self.interactable
    }

    /// Whether key presses should reach this field.
    pub fn accepts_keys(&self) -> bool {
        self.focused && self.interactable
    }

    pub fn line_mode(&self) -> LineMode {
        self.line_mode
    }

    pub fn set_line_mode(&mut self, mode: LineMode) {
        self.line_mode = mode;
    }

    // --- Editing -------------------------------------------------------------

    pub fn insert(&mut self, s: &str) {
        self.text.insert_str(self.caret, s);
        self.caret += s.len();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.text.replace_range(prev..self.caret, "");
            self.caret = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.text.replace_range(self.caret..next, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.caret = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.caret = next;
        }
    }

    pub fn move_home(&mut self) {
        self.caret = 0;
    }

    pub fn move_end(&mut self) {
        self.caret = self.text.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.caret].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.caret..]
            .chars()
            .next()
            .map(|c| self.caret + c.len_utf8())
    }
}
