//! Panel system - overlay panel lifecycle and presentation
//!
//! This module manages floating overlay panels: when they are shown, where
//! they are placed, and how they animate in and out.
//!
//! ## Architecture
//!
//! - `PanelState`: Hidden, Appearing, Presented or Dismissing
//! - `PanelLifecycle`: the transition table and in-flight transition tracking
//! - `PanelWindow`: the narrow interface to the host window system
//! - `PanelController`: lifecycle + geometry over one owned window
//! - `PanelStyle`: blueprints bundling configuration, strategies and timing
//!
//! ## Owner context
//!
//! A controller is driven from a single thread. Transition completions and
//! requests from [`PanelActions`] arrive over a channel and are applied by
//! [`PanelController::process_events`] or
//! [`PanelController::wait_until_settled`].

mod configuration;
mod controller;
pub mod headless;
mod lifecycle;
mod presentation;
mod state;
mod style;
mod window;

pub use configuration::{PanelConfiguration, WindowLevel, WorkspaceBehavior};
pub use controller::{PanelActions, PanelController, PanelError, PanelMsg};
pub use lifecycle::{LifecycleError, PanelLifecycle, TransitionId, TransitionKind};
pub use presentation::{Appearance, Presentation, TimingCurve, TransitionTiming};
pub use state::PanelState;
pub use style::{BackgroundImage, FloatingStyle, ImmersiveStyle, PanelStyle};
pub use window::{CompletionSignal, PanelWindow, Transition};
