//! Window handle interface
//!
//! The host window system is consumed only through [`PanelWindow`].
//! Timed transitions report back through a [`CompletionSignal`], which
//! posts exactly one completion message to the owning controller.

use std::sync::mpsc::Sender;

use crate::geometry::{Rect, Size};

use super::configuration::PanelConfiguration;
use super::controller::PanelMsg;
use super::lifecycle::{TransitionId, TransitionKind};
use super::presentation::{Appearance, TransitionTiming};

/// A timed change of appearance the window should animate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub id: TransitionId,
    pub kind: TransitionKind,
    pub timing: TransitionTiming,
    /// Appearance at the start of the transition
    pub from: Appearance,
    /// Appearance once the transition settles
    pub to: Appearance,
}

/// One-shot completion handle for a running transition.
///
/// Calling [`complete`](Self::complete) or simply dropping the signal posts
/// the completion to the controller's channel. Either way it is delivered
/// exactly once, and it is applied when the owner next processes its events.
#[derive(Debug)]
pub struct CompletionSignal {
    id: TransitionId,
    tx: Option<Sender<PanelMsg>>,
}

impl CompletionSignal {
    pub(crate) fn new(id: TransitionId, tx: Sender<PanelMsg>) -> Self {
        Self { id, tx: Some(tx) }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Report that the transition has settled
    pub fn complete(mut self) {
        self.send();
    }

    fn send(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The controller may already be gone; nothing is waiting then.
            let _ = tx.send(PanelMsg::TransitionFinished(self.id));
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.send();
    }
}

/// The host window a panel controller drives.
///
/// Implementations wrap the platform's window object. All methods are called
/// from the owner context; only [`CompletionSignal`] may cross threads.
pub trait PanelWindow {
    /// Apply window-system flags. Called once at construction.
    fn configure(&mut self, configuration: &PanelConfiguration);

    /// Bounds of the screen the panel should lay out on, if any screen exists
    fn screen_bounds(&self) -> Option<Rect>;

    /// Fitting size of the hosted content
    fn measured_content_size(&self) -> Size;

    /// Current window frame
    fn frame(&self) -> Rect;

    fn apply_frame(&mut self, frame: Rect);

    fn order_to_front(&mut self);

    fn order_out(&mut self);

    /// Set transient visual properties immediately, without animation
    fn set_appearance(&mut self, appearance: Appearance);

    /// Animate toward `transition.to` and signal `done` once settled
    fn run_transition(&mut self, transition: Transition, done: CompletionSignal);
}
