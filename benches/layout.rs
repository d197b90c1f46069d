//! Benchmarks for frame computation and transition sampling
//!
//! Run with: cargo bench --bench layout

use panelkit::geometry::{compute_frame, Point, PositionStrategy, Rect, Size, SizingStrategy};
use panelkit::panel::TimingCurve;

fn main() {
    divan::main();
}

const POSITIONS: [PositionStrategy; 5] = [
    PositionStrategy::Center,
    PositionStrategy::Top(20.0),
    PositionStrategy::Bottom(20.0),
    PositionStrategy::Absolute { x: 10.0, y: 10.0 },
    PositionStrategy::Ignore,
];

#[divan::bench]
fn compute_frame_all_positions() {
    let screen = Rect::new(0.0, 0.0, 2560.0, 1440.0);
    let sizing = SizingStrategy::Adapting {
        max_width: Some(800.0),
        max_height: None,
    };
    for position in POSITIONS {
        divan::black_box(compute_frame(
            divan::black_box(sizing),
            position,
            screen,
            divan::black_box(Size::new(640.0, 480.0)),
            Point::ZERO,
        ));
    }
}

#[divan::bench(args = [TimingCurve::Linear, TimingCurve::EaseIn, TimingCurve::EaseInEaseOut])]
fn sample_curve_60_frames(curve: TimingCurve) {
    for frame in 0..=60 {
        divan::black_box(curve.sample(frame as f64 / 60.0));
    }
}
