//! In-process window handle without a window system
//!
//! Records every call the controller makes so lifecycle ordering can be
//! observed. Used by the simulation binary and the test suite.

use std::collections::VecDeque;

use crate::geometry::{Point, Rect, Size};

use super::configuration::PanelConfiguration;
use super::lifecycle::{TransitionId, TransitionKind};
use super::presentation::Appearance;
use super::window::{CompletionSignal, PanelWindow, Transition};

/// A recorded window operation
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOp {
    Configure,
    ApplyFrame(Rect),
    OrderToFront,
    OrderOut,
    SetAppearance(Appearance),
    RunTransition { id: TransitionId, kind: TransitionKind },
}

/// How transitions settle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionMode {
    /// Held until [`HeadlessWindow::finish_next_transition`] is called
    #[default]
    Manual,
    /// Settle as soon as they start
    Immediate,
    /// Settle on a worker thread after the transition's duration
    Timed,
}

/// A window handle backed by plain fields
#[derive(Debug)]
pub struct HeadlessWindow {
    screen: Option<Rect>,
    content_size: Size,
    frame: Rect,
    appearance: Appearance,
    on_screen: bool,
    configuration: Option<PanelConfiguration>,
    mode: TransitionMode,
    pending: VecDeque<CompletionSignal>,
    ops: Vec<WindowOp>,
}

impl HeadlessWindow {
    pub fn new(screen: Rect) -> Self {
        Self {
            screen: Some(screen),
            content_size: Size::ZERO,
            frame: Rect::ZERO,
            appearance: Appearance::IDENTITY,
            on_screen: false,
            configuration: None,
            mode: TransitionMode::default(),
            pending: VecDeque::new(),
            ops: Vec::new(),
        }
    }

    /// A window whose host reports no screen at all
    pub fn without_screen() -> Self {
        Self {
            screen: None,
            ..Self::new(Rect::ZERO)
        }
    }

    pub fn with_content_size(mut self, size: Size) -> Self {
        self.content_size = size;
        self
    }

    pub fn with_mode(mut self, mode: TransitionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Start from a given frame (e.g. one the user dragged the panel to)
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.frame.x = origin.x;
        self.frame.y = origin.y;
        self
    }

    pub fn set_content_size(&mut self, size: Size) {
        self.content_size = size;
    }

    pub fn set_screen(&mut self, screen: Option<Rect>) {
        self.screen = screen;
    }

    pub fn ops(&self) -> &[WindowOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn is_on_screen(&self) -> bool {
        self.on_screen
    }

    pub fn configuration(&self) -> Option<&PanelConfiguration> {
        self.configuration.as_ref()
    }

    /// Transitions started in manual mode that have not settled yet
    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    /// Settle the oldest held transition. Returns `false` if none is held.
    pub fn finish_next_transition(&mut self) -> bool {
        match self.pending.pop_front() {
            Some(signal) => {
                signal.complete();
                true
            }
            None => false,
        }
    }
}

impl PanelWindow for HeadlessWindow {
    fn configure(&mut self, configuration: &PanelConfiguration) {
        self.configuration = Some(configuration.clone());
        self.ops.push(WindowOp::Configure);
    }

    fn screen_bounds(&self) -> Option<Rect> {
        self.screen
    }

    fn measured_content_size(&self) -> Size {
        self.content_size
    }

    fn frame(&self) -> Rect {
        self.frame
    }

    fn apply_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.ops.push(WindowOp::ApplyFrame(frame));
    }

    fn order_to_front(&mut self) {
        self.on_screen = true;
        self.ops.push(WindowOp::OrderToFront);
    }

    fn order_out(&mut self) {
        self.on_screen = false;
        self.ops.push(WindowOp::OrderOut);
    }

    fn set_appearance(&mut self, appearance: Appearance) {
        self.appearance = appearance;
        self.ops.push(WindowOp::SetAppearance(appearance));
    }

    fn run_transition(&mut self, transition: Transition, done: CompletionSignal) {
        // Like an animator proxy: the model value jumps to the target and
        // the presentation catches up over the duration.
        self.appearance = transition.to;
        self.ops.push(WindowOp::RunTransition {
            id: transition.id,
            kind: transition.kind,
        });

        match self.mode {
            TransitionMode::Manual => self.pending.push_back(done),
            TransitionMode::Immediate => done.complete(),
            TransitionMode::Timed => {
                let duration = transition.timing.duration;
                std::thread::spawn(move || {
                    std::thread::sleep(duration);
                    done.complete();
                });
            }
        }
    }
}
