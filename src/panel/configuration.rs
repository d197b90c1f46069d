//! Window-system level panel configuration
//!
//! These values are forwarded to the window handle once at construction.
//! Nothing in the lifecycle or geometry code interprets them.

use serde::{Deserialize, Serialize};

/// Z-order level of the panel window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowLevel {
    Normal,
    #[default]
    Floating,
    ModalPanel,
    PopUpMenu,
    /// Above the dock and menu bar
    ScreenSaver,
}

/// How the panel participates in workspace (Spaces) switching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceBehavior {
    pub join_all_spaces: bool,
    pub stationary: bool,
    pub ignores_cycle: bool,
    pub full_screen_auxiliary: bool,
}

/// Configuration for the underlying panel window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfiguration {
    pub level: WindowLevel,
    pub workspace: WorkspaceBehavior,
    /// No title bar or frame
    pub borderless: bool,
    /// Does not activate the owning application when clicked
    pub non_activating: bool,
    pub is_opaque: bool,
    pub has_shadow: bool,
    /// Window background in ARGB format (alpha in high byte)
    pub background: u32,
    /// Hide when the application loses focus
    pub hides_on_deactivate: bool,
    /// Accept keyboard focus even when non-activating
    pub can_become_key: bool,
}

impl PanelConfiguration {
    /// A regular floating utility panel
    pub fn floating() -> Self {
        Self {
            level: WindowLevel::Floating,
            workspace: WorkspaceBehavior::default(),
            borderless: false,
            non_activating: true,
            is_opaque: false,
            has_shadow: true,
            background: 0x00000000,
            hides_on_deactivate: true,
            can_become_key: true,
        }
    }

    /// Covers the dock and menu bar on every space
    pub fn immersive() -> Self {
        Self {
            level: WindowLevel::ScreenSaver,
            workspace: WorkspaceBehavior {
                join_all_spaces: true,
                stationary: true,
                ignores_cycle: true,
                full_screen_auxiliary: true,
            },
            borderless: true,
            non_activating: true,
            is_opaque: false,
            has_shadow: false,
            background: 0x00000000,
            hides_on_deactivate: false,
            can_become_key: true,
        }
    }

    pub fn with_background(mut self, background: u32) -> Self {
        self.background = background;
        self
    }
}

impl Default for PanelConfiguration {
    fn default() -> Self {
        Self::floating()
    }
}
