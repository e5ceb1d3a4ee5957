//! Panel visibility state machine.
//!
//! ```text
//! Hidden ──SetVisible(true)──▶ Showing{anim} ──Tick…──▶ Shown
//!   ▲                                                     │
//!   └──────── Tick… ◀── Hiding{anim} ◀──SetVisible(false)─┘
//! ```
//!
//! Any `SetVisible` restarts the animation from the panel's current anchors,
//! cancelling one already in flight. Showing activates the panel at once and
//! hands focus to the input when the animation ends; hiding makes the input
//! non-interactable at once and deactivates the panel when it ends.

use std::cell::Cell;

use statig::prelude::*;
use tracing::debug;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Normalised anchor point relative to the parent rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Anchor, t: f32) -> Anchor {
        if t >= 1.0 {
            return to;
        }
        let t = t.max(0.0);
        Anchor {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// The panel's anchor rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub min: Anchor,
    pub max: Anchor,
}

impl Anchors {
    /// Filling the parent.
    pub const SHOWN: Anchors = Anchors {
        min: Anchor::new(0.0, 0.0),
        max: Anchor::new(1.0, 1.0),
    };

    /// One parent-height above the top edge.
    pub const HIDDEN: Anchors = Anchors {
        min: Anchor::new(0.0, 1.0),
        max: Anchor::new(1.0, 2.0),
    };

    pub fn target(visible: bool) -> Anchors {
        if visible { Self::SHOWN } else { Self::HIDDEN }
    }

    pub fn lerp(self, to: Anchors, t: f32) -> Anchors {
        Anchors {
            min: self.min.lerp(to.min, t),
            max: self.max.lerp(to.max, t),
        }
    }
}

/// What a host renders for the panel each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    pub anchors: Anchors,
    pub active: bool,
}

/// Coarse phase for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPhase {
    Hidden,
    Showing,
    Shown,
    Hiding,
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// One in-flight transition, advanced once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    target: bool,
    t: f32,
    start: Anchors,
}

impl Animation {
    fn new(target: bool, immediate: bool, start: Anchors) -> Self {
        Self {
            target,
            t: if immediate { 1.0 } else { 0.0 },
            start,
        }
    }

    pub fn progress(&self) -> f32 {
        self.t.min(1.0)
    }

    /// Advance by `step`, write the interpolated anchors and report whether
    /// the transition is complete.
    fn advance(&mut self, step: f32, anchors: &mut Anchors) -> bool {
        self.t += step;
        *anchors = self.start.lerp(Anchors::target(self.target), self.t);
        self.t >= 1.0
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum VisibilityEvent {
    /// Start a transition toward `visible`; `immediate` finishes it at once.
    SetVisible { visible: bool, immediate: bool },
    /// One scheduling tick of `dt` seconds.
    Tick { dt: f32 },
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

/// Shared storage for the visibility state machine.
pub struct VisibilityMachine {
    speed: f32,
    visible: bool,
    panel: PanelLayout,
    input_interactable: bool,
    focus_requested: Cell<bool>,
}

impl VisibilityMachine {
    /// A machine whose panel is laid out shown, matching a freshly built UI.
    /// Hosts settle the real starting state with an immediate `SetVisible`.
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            visible: true,
            panel: PanelLayout {
                anchors: Anchors::SHOWN,
                active: true,
            },
            input_interactable: true,
            focus_requested: Cell::new(false),
        }
    }

    /// Target of the current or last transition.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn panel(&self) -> PanelLayout {
        self.panel
    }

    pub fn input_interactable(&self) -> bool {
        self.input_interactable
    }

    /// Whether the input should grab focus; resets the request.
    pub fn take_focus_request(&self) -> bool {
        self.focus_requested.replace(false)
    }

    pub fn phase(state: &State) -> VisibilityPhase {
        match state {
            State::Hidden {} => VisibilityPhase::Hidden,
            State::Showing { .. } => VisibilityPhase::Showing,
            State::Shown {} => VisibilityPhase::Shown,
            State::Hiding { .. } => VisibilityPhase::Hiding,
        }
    }

    fn begin(&mut self, visible: bool, immediate: bool) -> Outcome<State> {
        debug!(target: "console", visible, immediate, "panel transition started");
        self.visible = visible;
        if visible {
            self.panel.active = true;
        } else {
            self.input_interactable = false;
        }
        let animation = Animation::new(visible, immediate, self.panel.anchors);
        // First step runs right away, like a coroutine started this frame.
        self.step(animation, 0.0)
    }

    fn step(&mut self, mut animation: Animation, dt: f32) -> Outcome<State> {
        if animation.advance(dt * self.speed, &mut self.panel.anchors) {
            self.finish(animation.target)
        } else if animation.target {
            Transition(State::showing(animation))
        } else {
            Transition(State::hiding(animation))
        }
    }

    fn finish(&mut self, visible: bool) -> Outcome<State> {
        if visible {
            self.input_interactable = true;
            self.focus_requested.set(true);
            Transition(State::shown())
        } else {
            self.panel.active = false;
            Transition(State::hidden())
        }
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(
    initial = "State::shown()",
    state(derive(Debug, Clone, PartialEq))
)]
impl VisibilityMachine {
    /// Handles `SetVisible` for every state.
    #[superstate]
    fn visibility(&mut self, event: &VisibilityEvent) -> Outcome<State> {
        match event {
            VisibilityEvent::SetVisible { visible, immediate } => self.begin(*visible, *immediate),
            VisibilityEvent::Tick { .. } => Handled,
        }
    }

    #[state(superstate = "visibility")]
    fn hidden(&mut self, event: &VisibilityEvent) -> Outcome<State> {
        let _ = event;
        Super
    }

    #[state(superstate = "visibility")]
    fn showing(&mut self, animation: &Animation, event: &VisibilityEvent) -> Outcome<State> {
        match event {
            VisibilityEvent::Tick { dt } => self.step(animation.clone(), *dt),
            _ => Super,
        }
    }

    #[state(superstate = "visibility")]
    fn shown(&mut self, event: &VisibilityEvent) -> Outcome<State> {
        let _ = event;
        Super
    }

    #[state(superstate = "visibility")]
    fn hiding(&mut self, animation: &Animation, event: &VisibilityEvent) -> Outcome<State> {
        match event {
            VisibilityEvent::Tick { dt } => self.step(animation.clone(), *dt),
            _ => Super,
        }
    }
}

// ---------------------------------------------------------------------------
// Wrapper
// ---------------------------------------------------------------------------

/// Owns the running state machine.
pub struct Visibility {
    machine: StateMachine<VisibilityMachine>,
}

impl Visibility {
    pub fn new(speed: f32) -> Self {
        Self {
            machine: VisibilityMachine::new(speed).state_machine(),
        }
    }

    pub fn set_visible(&mut self, visible: bool, immediate: bool) {
        self.machine
            .handle(&VisibilityEvent::SetVisible { visible, immediate });
    }

    /// Flip the target and restart the transition.
    pub fn toggle(&mut self, immediate: bool) {
        let visible = !self.machine.is_visible();
        self.set_visible(visible, immediate);
    }

    pub fn tick(&mut self, dt: f32) {
        self.machine.handle(&VisibilityEvent::Tick { dt });
    }

    pub fn phase(&self) -> VisibilityPhase {
        VisibilityMachine::phase(self.machine.state())
    }

    pub fn is_visible(&self) -> bool {
        self.machine.is_visible()
    }

    pub fn panel(&self) -> PanelLayout {
        self.machine.panel()
    }

    pub fn input_interactable(&self) -> bool {
        self.machine.input_interactable()
    }

    pub fn take_focus_request(&self) -> bool {
        self.machine.take_focus_request()
    }

    /// Progress of the running animation, if any.
    pub fn progress(&self) -> Option<f32> {
        match self.machine.state() {
            State::Showing { animation } | State::Hiding { animation } => {
                Some(animation.progress())
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
