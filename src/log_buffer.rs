//! Pending output and the rich-text fragments that make up the transcript.
//!
//! Fragments use the `<b>`, `<i>` and `<color=#RRGGBBAA>` tags understood by
//! the host's text widget. Every fragment starts on a new line and ends with a
//! trailing space.

use std::mem;

use crate::config::Palette;
use crate::log_source::{LogEvent, Severity};

/// Output accumulated since the last flush.
#[derive(Debug, Default)]
pub struct LogBuffer {
    pending: String,
    suspend_next: bool,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append script output. Blank text (including a lone newline) is dropped.
    ///
    /// Returns whether anything was appended.
    pub fn write(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.pending.push_str(&script_fragment(text));
        true
    }

    pub fn push_log(&mut self, event: &LogEvent, palette: &Palette) {
        self.pending.push_str(&log_fragment(event, palette));
    }

    /// Put `text` ahead of everything pending.
    pub fn prepend(&mut self, text: &str) {
        self.pending.insert_str(0, text);
    }

    /// Discard whatever the next flush would have rendered.
    pub fn suspend_next(&mut self) {
        self.suspend_next = true;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_next
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Empty the buffer and clear the suspend flag.
    ///
    /// Returns the content to render, or `None` when it was suspended.
    pub fn take(&mut self) -> Option<String> {
        let content = mem::take(&mut self.pending);
        if mem::replace(&mut self.suspend_next, false) {
            None
        } else {
            Some(content)
        }
    }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

pub fn script_fragment(text: &str) -> String {
    format!("\n<i>>>>{text}</i> ")
}

pub fn log_fragment(event: &LogEvent, palette: &Palette) -> String {
    let color = match event.severity {
        Severity::Error | Severity::Assert | Severity::Exception => &palette.error,
        Severity::Warning => &palette.warning,
        Severity::Info => &palette.info,
    };
    let mut message = format!("[{}] {}", event.severity, event.message);
    if event.severity.carries_trace() {
        message.push('\n');
        message.push_str(&event.trace);
    }
    format!("\n<i><color={color}>{message}</color></i> ")
}

/// The bold line standing for a submitted command, tinted when it failed.
pub fn echo_line(command: &str, failed: bool, palette: &Palette) -> String {
    if failed {
        format!("\n<b><color={}>{command}</color></b> ", palette.error_echo)
    } else {
        format!("\n<b>{command}</b> ")
    }
}

/// Remove markup tags, leaving the visible text.
///
/// Only tags this module emits are recognised; any other `<` is kept as text.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) if is_markup_tag(&tail[1..end]) => rest = &tail[end + 1..],
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_markup_tag(inner: &str) -> bool {
    let name = inner.strip_prefix('/').unwrap_or(inner);
    matches!(name, "b" | "i" | "color") || name.starts_with("color=")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
