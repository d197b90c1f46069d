//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panelkit::geometry::{PositionStrategy, Rect, Size, SizingStrategy};
use panelkit::panel::headless::{HeadlessWindow, TransitionMode, WindowOp};
use panelkit::panel::{PanelConfiguration, PanelController, Presentation, TransitionId};

/// Generous upper bound for anything that waits on a worker thread
pub const WAIT: Duration = Duration::from_secs(5);

/// A 1440x900 screen at the origin
pub fn screen() -> Rect {
    Rect::new(0.0, 0.0, 1440.0, 900.0)
}

/// Fixed 200x100 panel centered on [`screen`], transitions settled by hand
pub fn manual_controller() -> PanelController<HeadlessWindow> {
    controller_with(
        HeadlessWindow::new(screen()),
        SizingStrategy::Fixed {
            width: 200.0,
            height: 100.0,
        },
        PositionStrategy::Center,
    )
}

pub fn controller_with(
    window: HeadlessWindow,
    sizing: SizingStrategy,
    position: PositionStrategy,
) -> PanelController<HeadlessWindow> {
    PanelController::new(
        window,
        PanelConfiguration::floating(),
        sizing,
        position,
        Presentation::default(),
    )
}

/// Drive a manual controller into `Presented`
pub fn presented_controller() -> PanelController<HeadlessWindow> {
    let mut controller = manual_controller();
    assert_eq!(controller.present(), Ok(true));
    settle(&mut controller);
    controller
}

/// Finish the next held transition and apply its completion
pub fn settle(controller: &mut PanelController<HeadlessWindow>) {
    assert!(
        controller.window_mut().finish_next_transition(),
        "no transition was running"
    );
    controller.process_events();
}

/// Window with transitions that settle on their own
pub fn immediate_window() -> HeadlessWindow {
    HeadlessWindow::new(screen()).with_mode(TransitionMode::Immediate)
}

/// Ids of every transition the window was asked to run, in order
pub fn transition_ids(window: &HeadlessWindow) -> Vec<TransitionId> {
    window
        .ops()
        .iter()
        .filter_map(|op| match op {
            WindowOp::RunTransition { id, .. } => Some(*id),
            _ => None,
        })
        .collect()
}

pub fn content(width: f64, height: f64) -> Size {
    Size::new(width, height)
}

/// Write a solid-color PNG of the given size and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 90, 160, 255]));
    image.save(&path).expect("Failed to write test image");
    path
}

/// A loader that counts invocations and returns `value`
pub fn counting_loader<V: Send + 'static>(
    calls: &Arc<AtomicUsize>,
    value: V,
) -> impl FnOnce() -> anyhow::Result<V> + Send + 'static {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}
