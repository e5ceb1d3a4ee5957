//! Shared output side of a console.
//!
//! `ConsoleHandle` is what scripts see as `console`: it can write output,
//! clear the transcript and toggle log mirroring. The owning [`Console`]
//! keeps a clone of the same handle, so the log buffer, transcript and log
//! subscription are one piece of state reachable from both sides. Everything
//! runs on the console's thread, so the handle is `!Send`.
//!
//! [`Console`]: crate::console::Console

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::Palette;
use crate::engine::{SceneObject, SelectionSource};
use crate::interceptor::LogInterceptor;
use crate::log_buffer::LogBuffer;
use crate::log_source::LogSource;
use crate::transcript::Transcript;

struct Output {
    buffer: LogBuffer,
    transcript: Transcript,
}

struct Shared {
    output: RefCell<Output>,
    interceptor: RefCell<LogInterceptor>,
    palette: Palette,
    listening: Cell<bool>,
    executing: Cell<bool>,
    selection: RefCell<Option<Box<dyn SelectionSource>>>,
    /// Selection made without a source, waiting to be bound into the scope.
    pending_selection: RefCell<Option<Option<SceneObject>>>,
}

#[derive(Clone)]
pub struct ConsoleHandle(Rc<Shared>);

impl ConsoleHandle {
    pub fn new(transcript: Transcript, palette: Palette, listening: bool) -> Self {
        Self(Rc::new(Shared {
            output: RefCell::new(Output {
                buffer: LogBuffer::new(),
                transcript,
            }),
            interceptor: RefCell::new(LogInterceptor::new(None)),
            palette,
            listening: Cell::new(listening),
            executing: Cell::new(false),
            selection: RefCell::new(None),
            pending_selection: RefCell::new(None),
        }))
    }

    // ------------------------------------------------------------------
    // Script-facing API
    // ------------------------------------------------------------------

    /// Queue script output for the next flush. Blank text is ignored.
    ///
    /// Log events already delivered are queued first, so pending output keeps
    /// arrival order.
    pub fn write(&self, text: &str) {
        self.pump_log_events();
        self.0.output.borrow_mut().buffer.write(text);
    }

    /// Select `object`: through the attached selection source, or else as
    /// the scope's next `selection` binding.
    pub fn select(&self, object: Option<SceneObject>) {
        match self.0.selection.borrow_mut().as_mut() {
            Some(source) => source.select(object),
            None => *self.0.pending_selection.borrow_mut() = Some(object),
        }
    }

    /// Empty the transcript and drop whatever the next flush would render.
    pub fn clear(&self) {
        let mut output = self.0.output.borrow_mut();
        output.transcript.clear();
        output.buffer.suspend_next();
    }

    /// Start mirroring application log events into the transcript.
    pub fn show_log(&self) {
        self.0.listening.set(true);
        self.0.interceptor.borrow_mut().enable();
    }

    pub fn hide_log(&self) {
        self.0.listening.set(false);
        self.0.interceptor.borrow_mut().disable();
    }

    pub fn is_listening(&self) -> bool {
        self.0.listening.get()
    }

    // ------------------------------------------------------------------
    // Host-facing accessors
    // ------------------------------------------------------------------

    pub fn transcript_text(&self) -> String {
        self.0.output.borrow().transcript.text().to_string()
    }

    pub fn pending(&self) -> String {
        self.0.output.borrow().buffer.pending().to_string()
    }

    pub fn scroll_position(&self) -> f32 {
        self.0.output.borrow().transcript.scroll_position()
    }

    pub fn scroll_by(&self, lines: f32) {
        self.0.output.borrow_mut().transcript.scroll_by(lines);
    }

    pub fn palette(&self) -> &Palette {
        &self.0.palette
    }

    pub fn is_subscribed(&self) -> bool {
        self.0.interceptor.borrow().is_enabled()
    }

    // ------------------------------------------------------------------
    // Console internals
    // ------------------------------------------------------------------

    pub(crate) fn set_log_source(&self, source: Arc<dyn LogSource>) {
        self.0.interceptor.borrow_mut().set_source(source);
    }

    /// Re-subscribe if the listening preference is on.
    pub(crate) fn resume_log(&self) {
        if self.is_listening() {
            self.0.interceptor.borrow_mut().enable();
        }
    }

    /// Unsubscribe without touching the listening preference.
    pub(crate) fn pause_log(&self) {
        self.0.interceptor.borrow_mut().disable();
    }

    pub(crate) fn set_selection_source(&self, source: Box<dyn SelectionSource>) {
        *self.0.selection.borrow_mut() = Some(source);
    }

    /// The value to bind as `selection`, if there is one to publish.
    ///
    /// With a source attached this is always its current selection; otherwise
    /// it is the last `select` since the previous call.
    pub(crate) fn take_selection(&self) -> Option<Option<SceneObject>> {
        if let Some(source) = self.0.selection.borrow().as_ref() {
            return Some(source.selected());
        }
        self.0.pending_selection.borrow_mut().take()
    }

    pub(crate) fn set_executing(&self, executing: bool) {
        self.0.executing.set(executing);
    }

    pub fn is_executing(&self) -> bool {
        self.0.executing.get()
    }

    pub(crate) fn prepend(&self, text: &str) {
        self.0.output.borrow_mut().buffer.prepend(text);
    }

    /// Format every log event received since the last pump into the buffer.
    ///
    /// While a command is executing the events stay pending and are committed
    /// by that command's flush; otherwise each one is flushed as it arrives.
    pub(crate) fn pump_log_events(&self) -> usize {
        let events = self.0.interceptor.borrow().drain();
        for event in &events {
            self.0
                .output
                .borrow_mut()
                .buffer
                .push_log(event, &self.0.palette);
            if !self.is_executing() {
                self.flush();
            }
        }
        events.len()
    }

    /// Commit pending output to the transcript (unless suspended) and
    /// reconcile the scroll position.
    pub(crate) fn flush(&self) {
        let mut output = self.0.output.borrow_mut();
        let content = output.buffer.take().unwrap_or_default();
        output.transcript.append(&content);
    }

    pub(crate) fn pin_to_bottom(&self) {
        self.0.output.borrow_mut().transcript.pin_to_bottom();
    }
}

impl fmt::Debug for ConsoleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleHandle")
            .field("listening", &self.0.listening.get())
            .field("executing", &self.0.executing.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrollConfig;
    use crate::log_source::{LogEvent, LogHub, Severity};

    fn handle() -> ConsoleHandle {
        ConsoleHandle::new(Transcript::new(ScrollConfig::default()), Palette::default(), true)
    }

    #[test]
    fn write_waits_for_flush() {
        let h = handle();
        h.write("hi");
        assert_eq!(h.transcript_text(), "");
        h.flush();
        assert_eq!(h.transcript_text(), "\n<i>>>>hi</i> ");
    }

    #[test]
    fn clear_discards_next_flush_only() {
        let h = handle();
        h.write("before");
        h.flush();
        h.write("pending");
        h.clear();
        h.flush();
        assert_eq!(h.transcript_text(), "");

        h.write("after");
        h.flush();
        assert_eq!(h.transcript_text(), "\n<i>>>>after</i> ");
    }

    #[test]
    fn idle_log_events_flush_immediately() {
        let hub = LogHub::new();
        let h = handle();
        h.set_log_source(Arc::new(hub.clone()));
        h.resume_log();

        hub.emit(LogEvent::new(Severity::Info, "loaded"));
        assert_eq!(h.pump_log_events(), 1);
        assert!(h.transcript_text().contains("[Info] loaded"));
        assert_eq!(h.pending(), "");
    }

    #[test]
    fn log_events_during_execution_stay_pending() {
        let hub = LogHub::new();
        let h = handle();
        h.set_log_source(Arc::new(hub.clone()));
        h.resume_log();

        h.set_executing(true);
        hub.emit(LogEvent::new(Severity::Warning, "mid-command"));
        h.pump_log_events();
        assert_eq!(h.transcript_text(), "");
        assert!(h.pending().contains("mid-command"));
    }

    #[test]
    fn write_keeps_earlier_log_events_ahead() {
        let hub = LogHub::new();
        let h = handle();
        h.set_log_source(Arc::new(hub.clone()));
        h.resume_log();

        h.set_executing(true);
        hub.emit(LogEvent::new(Severity::Warning, "first"));
        h.write("second");
        let pending = h.pending();
        let first = pending.find("[Warning] first").unwrap();
        let second = pending.find(">>>second").unwrap();
        assert!(first < second, "got: {pending}");
        assert_eq!(h.transcript_text(), "");
    }

    #[test]
    fn select_without_source_is_taken_once() {
        let h = handle();
        assert_eq!(h.take_selection(), None);
        h.select(Some(SceneObject::new(2, "Lamp")));
        assert_eq!(h.take_selection(), Some(Some(SceneObject::new(2, "Lamp"))));
        assert_eq!(h.take_selection(), None);
    }

    #[test]
    fn select_with_source_routes_to_it() {
        struct Single(Option<SceneObject>);
        impl SelectionSource for Single {
            fn selected(&self) -> Option<SceneObject> {
                self.0.clone()
            }
            fn select(&mut self, object: Option<SceneObject>) {
                self.0 = object;
            }
        }

        let h = handle();
        h.set_selection_source(Box::new(Single(None)));
        h.select(Some(SceneObject::new(4, "Tree")));
        assert_eq!(h.take_selection(), Some(Some(SceneObject::new(4, "Tree"))));
        assert_eq!(h.take_selection(), Some(Some(SceneObject::new(4, "Tree"))));
    }

    #[test]
    fn hide_and_show_log_track_preference() {
        let hub = LogHub::new();
        let h = handle();
        h.set_log_source(Arc::new(hub.clone()));
        h.resume_log();
        assert!(h.is_subscribed());

        h.hide_log();
        assert!(!h.is_listening());
        h.resume_log();
        assert!(!h.is_subscribed());

        h.show_log();
        assert!(h.is_subscribed());
        assert_eq!(hub.subscriber_count(), 1);
    }
}
