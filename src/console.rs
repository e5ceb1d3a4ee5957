//! The developer console: command execution, keyboard routing and the
//! per-tick update.
//!
//! A host owns one `Console`, forwards key presses to [`Console::handle_key`],
//! calls [`Console::tick`] once per frame and renders [`Console::panel`],
//! [`Console::input`] and [`Console::transcript_text`]. All work happens on
//! the caller's thread; a running command blocks until it returns.

use std::sync::Arc;

use tracing::{debug, error};
use winit::keyboard::{Key, ModifiersState, NamedKey};

use crate::config::ConsoleConfig;
use crate::engine::{SceneObject, ScriptEngine, ScriptValue, SelectionSource, SymbolCatalog};
use crate::error::ConsoleError;
use crate::handle::ConsoleHandle;
use crate::history::{CommandHistory, Direction};
use crate::input::{InputLine, LineMode};
use crate::log_buffer::echo_line;
use crate::log_source::LogSource;
use crate::scope::ScopeManager;
use crate::transcript::Transcript;
use crate::visibility::{PanelLayout, Visibility, VisibilityPhase};

/// Result of a submission, for the host's information only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// The script raised an error; its message is already in the transcript.
    Failed(String),
    /// The user aborted the input; nothing ran.
    Cancelled,
}

pub struct Console<E: ScriptEngine> {
    config: ConsoleConfig,
    handle: ConsoleHandle,
    scope: ScopeManager<E>,
    history: CommandHistory,
    input: InputLine,
    visibility: Visibility,
}

// ---------------------------------------------------------------------------
// Construction and lifecycle
// ---------------------------------------------------------------------------

impl<E: ScriptEngine> Console<E> {
    pub fn new(engine: E, config: ConsoleConfig) -> Result<Self, ConsoleError> {
        config.validate()?;
        let palette = config.theme.palette()?;
        let handle = ConsoleHandle::new(
            Transcript::new(config.scroll.clone()),
            palette,
            config.listen_to_log,
        );
        Ok(Self {
            scope: ScopeManager::new(engine, config.bootstrap_script.clone()),
            visibility: Visibility::new(config.appear_speed),
            handle,
            history: CommandHistory::new(),
            input: InputLine::new(),
            config,
        })
    }

    pub fn with_log_source(self, source: Arc<dyn LogSource>) -> Self {
        self.handle.set_log_source(source);
        self
    }

    pub fn with_symbols(mut self, symbols: impl SymbolCatalog + 'static) -> Self {
        self.scope.set_symbols(Box::new(symbols));
        self
    }

    pub fn with_selection(self, selection: impl SelectionSource + 'static) -> Self {
        self.handle.set_selection_source(Box::new(selection));
        self
    }

    /// Enable the console and settle the panel in its default visibility.
    pub fn start(&mut self) {
        self.enable();
        self.visibility
            .set_visible(self.config.visible_by_default, true);
        self.sync_input();
    }

    /// Create the scope if needed and resume log mirroring.
    pub fn enable(&mut self) {
        self.ensure_scope();
        self.handle.resume_log();
    }

    /// Stop receiving log events. The listening preference is kept, so a
    /// later [`enable`](Self::enable) resumes mirroring.
    pub fn disable(&mut self) {
        self.handle.pause_log();
    }

    fn ensure_scope(&mut self) {
        match self.scope.ensure_scope(&self.handle) {
            Ok(true) => debug!(target: "console", "script scope ready"),
            Ok(false) => {}
            Err(err) => {
                error!(target: "console", %err, "script scope bootstrap failed");
                self.handle.write(&err.to_string());
                self.handle.flush();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

impl<E: ScriptEngine> Console<E> {
    /// Run `command` against the scope and commit its echo and output.
    ///
    /// A failing command is reported in the transcript and never propagates.
    pub fn submit(&mut self, command: &str) -> CommandOutcome {
        self.input.clear();
        self.input.activate();
        self.history.record(command);
        self.history.reset();

        self.ensure_scope();
        // Anything logged before this command belongs above its echo.
        self.handle.pump_log_events();

        self.handle.set_executing(true);
        let result = self.scope.execute(command);
        if let Err(err) = &result {
            self.handle.write(&err.message);
        }
        // Log events raised after the command's last write.
        self.handle.pump_log_events();
        self.handle.set_executing(false);
        // A `console.select` from the command takes effect for the next one.
        self.publish_selection();

        let failed = result.is_err();
        debug!(target: "console", command, failed, "command executed");
        let echo = echo_line(command, failed, self.handle.palette());
        self.handle.prepend(&echo);
        self.handle.flush();
        self.handle.pin_to_bottom();

        match result {
            Ok(()) => CommandOutcome::Completed,
            Err(err) => CommandOutcome::Failed(err.message),
        }
    }

    /// Submit whatever is in the input field.
    pub fn submit_input(&mut self) -> CommandOutcome {
        let command = self.input.text().to_string();
        self.submit(&command)
    }

    /// An aborted submission: keep the input focused and do nothing else.
    pub fn cancel(&mut self) -> CommandOutcome {
        self.input.activate();
        CommandOutcome::Cancelled
    }

    /// Recall a history entry into the input. Returns whether the input
    /// changed.
    pub fn navigate_history(&mut self, direction: Direction) -> bool {
        match self
            .history
            .navigate(direction, self.input.line_count())
        {
            Some(text) => {
                self.input.set_text(&text);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Surface shared with scripts
// ---------------------------------------------------------------------------

impl<E: ScriptEngine> Console<E> {
    pub fn write(&self, text: &str) {
        self.handle.write(text);
    }

    pub fn clear(&self) {
        self.handle.clear();
    }

    pub fn show_log(&self) {
        self.handle.show_log();
    }

    pub fn hide_log(&self) {
        self.handle.hide_log();
    }

    /// Select `object`: through the editor selection when one is attached,
    /// otherwise by rebinding `selection` in the scope.
    pub fn select(&mut self, object: Option<SceneObject>) {
        self.handle.select(object);
        self.publish_selection();
    }

    fn publish_selection(&mut self) {
        if !self.scope.has_scope() {
            return;
        }
        if let Some(object) = self.handle.take_selection() {
            self.scope.set_variable("selection", object.into());
        }
    }

    pub fn set_variable(&mut self, name: &str, value: ScriptValue) {
        self.scope.set_variable(name, value);
    }

    pub fn handle(&self) -> &ConsoleHandle {
        &self.handle
    }
}

// ---------------------------------------------------------------------------
// Per-tick update and keyboard
// ---------------------------------------------------------------------------

impl<E: ScriptEngine> Console<E> {
    /// Advance the console by one scheduling tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.publish_selection();
        self.visibility.tick(dt);
        self.sync_input();
        self.handle.pump_log_events();
    }

    pub fn toggle(&mut self, immediate: bool) {
        self.visibility.toggle(immediate);
        self.sync_input();
    }

    pub fn set_visible(&mut self, visible: bool, immediate: bool) {
        self.visibility.set_visible(visible, immediate);
        self.sync_input();
    }

    /// Route a key press. Returns whether the console consumed it.
    pub fn handle_key(&mut self, key: &Key, modifiers: ModifiersState) -> bool {
        if self.is_toggle_key(key) {
            self.toggle(false);
            return true;
        }
        if !self.input.accepts_keys() {
            return false;
        }

        let mode = if modifiers.shift_key() {
            LineMode::MultiLineNewline
        } else {
            LineMode::MultiLineSubmit
        };
        if self.input.line_mode() != mode {
            self.input.set_line_mode(mode);
        }

        match key {
            Key::Named(NamedKey::ArrowUp) => {
                self.navigate_history(Direction::Up);
            }
            Key::Named(NamedKey::ArrowDown) => {
                self.navigate_history(Direction::Down);
            }
            Key::Named(NamedKey::Enter) => match self.input.line_mode() {
                LineMode::MultiLineNewline => self.input.insert("\n"),
                LineMode::MultiLineSubmit => {
                    self.submit_input();
                }
            },
            Key::Named(NamedKey::Escape) => {
                self.cancel();
            }
            Key::Named(NamedKey::Backspace) => self.input.backspace(),
            Key::Named(NamedKey::Delete) => self.input.delete(),
            Key::Named(NamedKey::ArrowLeft) => self.input.move_left(),
            Key::Named(NamedKey::ArrowRight) => self.input.move_right(),
            Key::Named(NamedKey::Home) => self.input.move_home(),
            Key::Named(NamedKey::End) => self.input.move_end(),
            Key::Named(NamedKey::Space) => self.input.insert(" "),
            Key::Named(NamedKey::Tab) => self.input.insert("    "),
            Key::Character(c) if modifiers.control_key() => {
                if c.eq_ignore_ascii_case("l") {
                    self.clear();
                } else {
                    return false;
                }
            }
            Key::Character(c) => self.input.insert(c.as_str()),
            _ => return false,
        }
        true
    }

    /// Scroll the transcript; positive `lines` moves toward older output.
    pub fn scroll_by(&self, lines: f32) {
        self.handle.scroll_by(lines);
    }

    fn is_toggle_key(&self, key: &Key) -> bool {
        matches!(key, Key::Character(c) if c.as_str() == self.config.toggle_key)
    }

    fn sync_input(&mut self) {
        self.input
            .set_interactable(self.visibility.input_interactable());
        if self.visibility.take_focus_request() {
            self.input.activate();
        }
        if !self.visibility.panel().active {
            self.input.blur();
        }
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl<E: ScriptEngine> Console<E> {
    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputLine {
        &mut self.input
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn transcript_text(&self) -> String {
        self.handle.transcript_text()
    }

    pub fn pending(&self) -> String {
        self.handle.pending()
    }

    pub fn scroll_position(&self) -> f32 {
        self.handle.scroll_position()
    }

    pub fn panel(&self) -> PanelLayout {
        self.visibility.panel()
    }

    pub fn phase(&self) -> VisibilityPhase {
        self.visibility.phase()
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    pub fn engine(&self) -> &E {
        self.scope.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.scope.engine_mut()
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }
}

impl<E: ScriptEngine> Drop for Console<E> {
    fn drop(&mut self) {
        self.handle.pause_log();
    }
}
