//! Panel style blueprints
//!
//! A style bundles everything a controller needs to build a panel:
//! window configuration, sizing and position strategies, and presentation.

use std::sync::Arc;

use crate::geometry::{PositionStrategy, SizingStrategy};

use super::configuration::PanelConfiguration;
use super::presentation::{Presentation, TimingCurve, TransitionTiming};
use super::state::PanelState;

/// Blueprint for a panel's behavior
pub trait PanelStyle {
    fn configuration(&self) -> PanelConfiguration;

    fn sizing(&self) -> SizingStrategy;

    fn position(&self) -> PositionStrategy;

    fn presentation(&self) -> Presentation;

    /// Scale the content should render at for a lifecycle state
    fn content_scale(&self, _state: PanelState) -> f64 {
        1.0
    }
}

/// A full-screen, launcher-like panel over a blurred wallpaper.
///
/// Fades the window in and out; content zooms in from slightly enlarged.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmersiveStyle {
    pub enter: TransitionTiming,
    pub exit: TransitionTiming,
}

impl ImmersiveStyle {
    /// Content scale while hidden or dismissing
    pub const RESTING_SCALE: f64 = 1.1;

    pub fn new() -> Self {
        Self {
            enter: TransitionTiming::from_millis(300, TimingCurve::EaseInEaseOut),
            exit: TransitionTiming::from_millis(300, TimingCurve::EaseInEaseOut),
        }
    }

    pub fn with_timing(enter: TransitionTiming, exit: TransitionTiming) -> Self {
        Self { enter, exit }
    }
}

impl Default for ImmersiveStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelStyle for ImmersiveStyle {
    fn configuration(&self) -> PanelConfiguration {
        PanelConfiguration::immersive()
    }

    fn sizing(&self) -> SizingStrategy {
        SizingStrategy::FullScreen
    }

    fn position(&self) -> PositionStrategy {
        PositionStrategy::Ignore
    }

    fn presentation(&self) -> Presentation {
        Presentation::fade(self.enter, self.exit)
    }

    fn content_scale(&self, state: PanelState) -> f64 {
        match state {
            PanelState::Hidden | PanelState::Dismissing => Self::RESTING_SCALE,
            PanelState::Appearing | PanelState::Presented => 1.0,
        }
    }
}

/// A floating panel sized to its content
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingStyle {
    pub sizing: SizingStrategy,
    pub position: PositionStrategy,
    pub presentation: Presentation,
}

impl Default for FloatingStyle {
    fn default() -> Self {
        Self {
            sizing: SizingStrategy::Adapting {
                max_width: None,
                max_height: None,
            },
            position: PositionStrategy::Center,
            presentation: Presentation::default(),
        }
    }
}

impl PanelStyle for FloatingStyle {
    fn configuration(&self) -> PanelConfiguration {
        PanelConfiguration::floating()
    }

    fn sizing(&self) -> SizingStrategy {
        self.sizing
    }

    fn position(&self) -> PositionStrategy {
        self.position
    }

    fn presentation(&self) -> Presentation {
        self.presentation
    }
}

/// The background image currently shown behind panel content.
///
/// Updating with the very same shared image is a no-op, which avoids
/// redundant redraws when a refresh produces an unchanged cache hit.
#[derive(Debug)]
pub struct BackgroundImage<T> {
    current: Option<Arc<T>>,
}

impl<T> BackgroundImage<T> {
    pub fn new(initial: Option<Arc<T>>) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Option<&Arc<T>> {
        self.current.as_ref()
    }

    /// Replace the image. Returns `true` if it actually changed.
    pub fn update(&mut self, image: Option<Arc<T>>) -> bool {
        let same = match (&self.current, &image) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }
        self.current = image;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.update(None)
    }
}

impl<T> Default for BackgroundImage<T> {
    fn default() -> Self {
        Self { current: None }
    }
}
