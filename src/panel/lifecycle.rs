//! Panel lifecycle state machine
//!
//! ```text
//!   Hidden ──present()──► Appearing ──enter done──► Presented
//!     ▲                                                 │
//!     └────exit done──── Dismissing ◄──dismiss()────────┘
//! ```
//!
//! `present()` while open and `dismiss()` while closed are no-ops, and so is
//! either request while a transition is animating. Settled states are only
//! reached through an explicit completion for the transition that is
//! currently in flight; the machine never assumes a duration.

use std::fmt;

use super::state::PanelState;

/// Identifies one started transition.
///
/// Ids are handed out in increasing order, so comparing two ids compares
/// their start order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(u64);

impl TransitionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direction of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Hidden to visible
    Enter,
    /// Visible to hidden
    Exit,
}

/// Errors reported by the lifecycle state machine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// A completion arrived for a transition that is not the one in flight
    #[error("unexpected completion for transition {id} (in flight: {in_flight:?})")]
    UnexpectedCompletion {
        id: TransitionId,
        in_flight: Option<TransitionId>,
    },
}

/// The lifecycle state machine of one panel
#[derive(Debug, Default)]
pub struct PanelLifecycle {
    state: PanelState,
    next_id: u64,
    in_flight: Option<(TransitionId, TransitionKind)>,
}

impl PanelLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// The transition currently animating, if any
    pub fn in_flight(&self) -> Option<(TransitionId, TransitionKind)> {
        self.in_flight
    }

    /// Closed and not animating
    pub fn can_present(&self) -> bool {
        !self.state.is_open() && !self.state.is_animating()
    }

    /// Open and not animating
    pub fn can_dismiss(&self) -> bool {
        self.state.is_open() && !self.state.is_animating()
    }

    /// Enter `Appearing` and allocate the enter transition.
    ///
    /// Returns `None` (and changes nothing) when the guard rejects the call.
    pub fn begin_present(&mut self) -> Option<TransitionId> {
        if !self.can_present() {
            tracing::debug!(state = %self.state, "present rejected");
            return None;
        }
        Some(self.begin(TransitionKind::Enter, PanelState::Appearing))
    }

    /// Enter `Dismissing` and allocate the exit transition.
    ///
    /// Returns `None` (and changes nothing) when the guard rejects the call.
    pub fn begin_dismiss(&mut self) -> Option<TransitionId> {
        if !self.can_dismiss() {
            tracing::debug!(state = %self.state, "dismiss rejected");
            return None;
        }
        Some(self.begin(TransitionKind::Exit, PanelState::Dismissing))
    }

    fn begin(&mut self, kind: TransitionKind, state: PanelState) -> TransitionId {
        let id = TransitionId(self.next_id);
        self.next_id += 1;
        self.in_flight = Some((id, kind));
        tracing::debug!(from = %self.state, to = %state, transition = %id, "transition started");
        self.state = state;
        id
    }

    /// Settle the in-flight transition.
    ///
    /// Returns the kind of the completed transition. Completions for any
    /// other id leave the state untouched.
    pub fn complete(&mut self, id: TransitionId) -> Result<TransitionKind, LifecycleError> {
        match self.in_flight {
            Some((current, kind)) if current == id => {
                let settled = match kind {
                    TransitionKind::Enter => PanelState::Presented,
                    TransitionKind::Exit => PanelState::Hidden,
                };
                tracing::debug!(from = %self.state, to = %settled, transition = %id, "transition settled");
                self.in_flight = None;
                self.state = settled;
                Ok(kind)
            }
            other => Err(LifecycleError::UnexpectedCompletion {
                id,
                in_flight: other.map(|(current, _)| current),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_hidden() {
        let lifecycle = PanelLifecycle::new();
        assert_eq!(lifecycle.state(), PanelState::Hidden);
        assert!(lifecycle.in_flight().is_none());
    }

    #[test]
    fn test_ids_increase_across_transitions() {
        let mut lifecycle = PanelLifecycle::new();
        let enter = lifecycle.begin_present().unwrap();
        lifecycle.complete(enter).unwrap();
        let exit = lifecycle.begin_dismiss().unwrap();
        assert!(exit > enter);
    }

    #[test]
    fn test_completion_for_stale_id_is_rejected() {
        let mut lifecycle = PanelLifecycle::new();
        let enter = lifecycle.begin_present().unwrap();
        lifecycle.complete(enter).unwrap();

        let err = lifecycle.complete(enter).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::UnexpectedCompletion {
                id: enter,
                in_flight: None
            }
        );
        assert_eq!(lifecycle.state(), PanelState::Presented);
    }

    #[test]
    fn test_dismiss_while_appearing_is_rejected() {
        let mut lifecycle = PanelLifecycle::new();
        lifecycle.begin_present().unwrap();
        assert!(lifecycle.begin_dismiss().is_none());
        assert_eq!(lifecycle.state(), PanelState::Appearing);
    }
}
