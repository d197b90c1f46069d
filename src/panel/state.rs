//! Panel lifecycle states

use std::fmt;

/// Lifecycle state of a panel window.
///
/// Drives both the window's visibility and the content's animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelState {
    /// Fully closed and removed from screen
    #[default]
    Hidden,
    /// Animating its entry
    Appearing,
    /// Fully visible, stable and interactive
    Presented,
    /// Animating its exit
    Dismissing,
}

impl PanelState {
    /// On screen in any form, including while animating
    pub fn is_visible(&self) -> bool {
        *self != PanelState::Hidden
    }

    /// Open or opening. Toggle closes the panel when this is true.
    pub fn is_open(&self) -> bool {
        matches!(self, PanelState::Appearing | PanelState::Presented)
    }

    /// In a transitional animation state
    pub fn is_animating(&self) -> bool {
        matches!(self, PanelState::Appearing | PanelState::Dismissing)
    }

    pub const ALL: [PanelState; 4] = [
        PanelState::Hidden,
        PanelState::Appearing,
        PanelState::Presented,
        PanelState::Dismissing,
    ];
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelState::Hidden => "hidden",
            PanelState::Appearing => "appearing",
            PanelState::Presented => "presented",
            PanelState::Dismissing => "dismissing",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(!PanelState::Hidden.is_visible());
        assert!(!PanelState::Hidden.is_open());
        assert!(!PanelState::Hidden.is_animating());

        assert!(PanelState::Appearing.is_open());
        assert!(PanelState::Appearing.is_animating());

        assert!(PanelState::Presented.is_open());
        assert!(!PanelState::Presented.is_animating());

        assert!(!PanelState::Dismissing.is_open());
        assert!(PanelState::Dismissing.is_animating());
        assert!(PanelState::Dismissing.is_visible());
    }
}
