//! Panel controller
//!
//! Composes the lifecycle state machine and the geometry engine over one
//! owned window handle. This is the type callers interact with.
//!
//! Side effects of `present()` happen in a fixed order:
//! layout, then visibility, then animation start. The window is framed
//! while still ordered out, so content never flashes at a stale frame.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::geometry::{compute_frame, PositionStrategy, Rect, SizingStrategy};

use super::configuration::PanelConfiguration;
use super::lifecycle::{PanelLifecycle, TransitionId, TransitionKind};
use super::presentation::{Appearance, Presentation};
use super::state::PanelState;
use super::style::PanelStyle;
use super::window::{CompletionSignal, PanelWindow, Transition};

/// Messages processed by a [`PanelController`] on its owner context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMsg {
    Present,
    Dismiss,
    Toggle,
    /// Recompute and apply the frame (content size may have changed)
    Relayout,
    /// A timed transition settled
    TransitionFinished(TransitionId),
}

/// Errors surfaced by the panel controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// The window system reported no screen to lay out on.
    ///
    /// This is a programmer-visible misconfiguration: debug builds assert,
    /// release builds refuse to show the panel.
    #[error("panel layout requires a screen but none is available")]
    NoScreen,
}

/// Cloneable handle that lets panel content drive its own panel.
///
/// Requests are posted to the controller's channel and applied the next
/// time the owner processes events, so the handle can be created before the
/// content it is given to and never holds the controller itself.
#[derive(Debug, Clone)]
pub struct PanelActions {
    tx: Sender<PanelMsg>,
}

impl PanelActions {
    pub fn dismiss(&self) {
        self.post(PanelMsg::Dismiss);
    }

    pub fn present(&self) {
        self.post(PanelMsg::Present);
    }

    pub fn toggle(&self) {
        self.post(PanelMsg::Toggle);
    }

    pub fn relayout(&self) {
        self.post(PanelMsg::Relayout);
    }

    fn post(&self, msg: PanelMsg) {
        if self.tx.send(msg).is_err() {
            tracing::debug!(?msg, "panel controller dropped, request ignored");
        }
    }
}

/// Drives one panel window through its lifecycle
pub struct PanelController<W: PanelWindow> {
    window: W,
    configuration: PanelConfiguration,
    sizing: SizingStrategy,
    position: PositionStrategy,
    presentation: Presentation,
    lifecycle: PanelLifecycle,
    msg_tx: Sender<PanelMsg>,
    msg_rx: Receiver<PanelMsg>,
}

impl<W: PanelWindow> PanelController<W> {
    pub fn new(
        mut window: W,
        configuration: PanelConfiguration,
        sizing: SizingStrategy,
        position: PositionStrategy,
        presentation: Presentation,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();

        window.configure(&configuration);
        window.set_appearance(presentation.hidden);

        tracing::debug!(?sizing, ?position, level = ?configuration.level, "panel controller created");

        Self {
            window,
            configuration,
            sizing,
            position,
            presentation,
            lifecycle: PanelLifecycle::new(),
            msg_tx,
            msg_rx,
        }
    }

    /// Build a controller from a style blueprint
    pub fn with_style<S: PanelStyle>(window: W, style: &S) -> Self {
        Self::new(
            window,
            style.configuration(),
            style.sizing(),
            style.position(),
            style.presentation(),
        )
    }

    pub fn state(&self) -> PanelState {
        self.lifecycle.state()
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    pub fn configuration(&self) -> &PanelConfiguration {
        &self.configuration
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn sizing(&self) -> SizingStrategy {
        self.sizing
    }

    pub fn position(&self) -> PositionStrategy {
        self.position
    }

    /// A handle content can use to request present/dismiss
    pub fn actions(&self) -> PanelActions {
        PanelActions {
            tx: self.msg_tx.clone(),
        }
    }

    /// Show the panel.
    ///
    /// Returns `Ok(false)` when the request is rejected because the panel is
    /// already open or animating.
    pub fn present(&mut self) -> Result<bool, PanelError> {
        if !self.lifecycle.can_present() {
            tracing::debug!(state = %self.state(), "present ignored");
            return Ok(false);
        }

        let frame = self.target_frame()?;
        let Some(id) = self.lifecycle.begin_present() else {
            return Ok(false);
        };

        self.window.apply_frame(frame);
        self.window.set_appearance(self.presentation.hidden);
        self.window.order_to_front();
        self.start_transition(id, TransitionKind::Enter);

        tracing::info!(frame = %frame, "panel presenting");
        Ok(true)
    }

    /// Hide the panel.
    ///
    /// Returns `false` when the request is rejected because the panel is
    /// already closed, closing, or still appearing.
    pub fn dismiss(&mut self) -> bool {
        let Some(id) = self.lifecycle.begin_dismiss() else {
            tracing::debug!(state = %self.state(), "dismiss ignored");
            return false;
        };

        self.start_transition(id, TransitionKind::Exit);
        tracing::info!("panel dismissing");
        true
    }

    /// Dismiss when open, present otherwise
    pub fn toggle(&mut self) -> Result<bool, PanelError> {
        if self.state().is_open() {
            Ok(self.dismiss())
        } else {
            self.present()
        }
    }

    /// Recompute the frame from the current content size and apply it
    pub fn relayout(&mut self) -> Result<Rect, PanelError> {
        let frame = self.target_frame()?;
        self.window.apply_frame(frame);
        Ok(frame)
    }

    /// Apply one message
    pub fn update(&mut self, msg: PanelMsg) -> Result<(), PanelError> {
        match msg {
            PanelMsg::Present => self.present().map(|_| ()),
            PanelMsg::Dismiss => {
                self.dismiss();
                Ok(())
            }
            PanelMsg::Toggle => self.toggle().map(|_| ()),
            PanelMsg::Relayout => {
                // Nothing to lay out while ordered out; present() lays out anyway.
                if self.state().is_visible() {
                    self.relayout()?;
                }
                Ok(())
            }
            PanelMsg::TransitionFinished(id) => {
                self.finish_transition(id);
                Ok(())
            }
        }
    }

    /// Drain queued messages without blocking.
    ///
    /// Returns the number of messages processed.
    pub fn process_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.apply_logged(msg);
            processed += 1;
        }
        processed
    }

    /// Block until no transition is animating, or until `timeout` elapses.
    ///
    /// Returns `true` if the panel settled.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_events();

        while self.state().is_animating() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.msg_rx.recv_timeout(remaining) {
                Ok(msg) => self.apply_logged(msg),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(state = %self.state(), "panel did not settle in {:?}", timeout);
                    return false;
                }
                // The controller holds a sender, so the channel outlives it.
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn apply_logged(&mut self, msg: PanelMsg) {
        if let Err(err) = self.update(msg) {
            tracing::error!(?msg, "panel message failed: {}", err);
        }
    }

    fn target_frame(&self) -> Result<Rect, PanelError> {
        let screen = self.window.screen_bounds();
        debug_assert!(
            screen.is_some(),
            "panel layout requires a screen but none is available"
        );
        let Some(screen) = screen else {
            tracing::error!("panel layout failed: no screen available");
            return Err(PanelError::NoScreen);
        };

        Ok(compute_frame(
            self.sizing,
            self.position,
            screen,
            self.window.measured_content_size(),
            self.window.frame().origin(),
        ))
    }

    fn start_transition(&mut self, id: TransitionId, kind: TransitionKind) {
        let (from, to, timing) = match kind {
            TransitionKind::Enter => (
                self.presentation.hidden,
                self.presentation.visible,
                self.presentation.enter,
            ),
            TransitionKind::Exit => (
                self.presentation.visible,
                self.presentation.hidden,
                self.presentation.exit,
            ),
        };

        let transition = Transition {
            id,
            kind,
            timing,
            from,
            to,
        };
        let done = CompletionSignal::new(id, self.msg_tx.clone());
        self.window.run_transition(transition, done);
    }

    fn finish_transition(&mut self, id: TransitionId) {
        // Exit side effects run before the state settles to Hidden.
        if self.lifecycle.in_flight() == Some((id, TransitionKind::Exit)) {
            self.window.order_out();
            self.window.set_appearance(Appearance::IDENTITY);
        }

        match self.lifecycle.complete(id) {
            Ok(kind) => tracing::info!(?kind, state = %self.state(), "panel transition finished"),
            Err(err) => tracing::warn!("{}", err),
        }
    }
}

impl<W: PanelWindow + std::fmt::Debug> std::fmt::Debug for PanelController<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelController")
            .field("window", &self.window)
            .field("state", &self.state())
            .field("sizing", &self.sizing)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
