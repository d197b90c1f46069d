//! Presentation timing and transient appearance
//!
//! A [`Presentation`] describes the two visual end states of a panel
//! (hidden and visible) and the timing of the transitions between them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing curve for a timed transition.
///
/// Control points match the standard cubic-bezier media timing functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingCurve {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInEaseOut,
}

impl TimingCurve {
    /// Bezier control points `(x1, y1, x2, y2)`
    pub fn control_points(&self) -> (f64, f64, f64, f64) {
        match self {
            TimingCurve::Linear => (0.0, 0.0, 1.0, 1.0),
            TimingCurve::EaseIn => (0.42, 0.0, 1.0, 1.0),
            TimingCurve::EaseOut => (0.0, 0.0, 0.58, 1.0),
            TimingCurve::EaseInEaseOut => (0.42, 0.0, 0.58, 1.0),
        }
    }

    /// Eased progress for linear progress `t` in `[0, 1]`
    pub fn sample(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if *self == TimingCurve::Linear {
            return t;
        }
        let (x1, y1, x2, y2) = self.control_points();

        // Solve x(s) = t for the curve parameter s, then evaluate y(s).
        let mut s = t;
        for _ in 0..8 {
            let x = bezier(s, x1, x2) - t;
            let dx = bezier_derivative(s, x1, x2);
            if x.abs() < 1e-6 || dx.abs() < 1e-6 {
                break;
            }
            s = (s - x / dx).clamp(0.0, 1.0);
        }
        bezier(s, y1, y2)
    }
}

fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_derivative(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Duration and easing of one transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionTiming {
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    #[serde(default)]
    pub curve: TimingCurve,
}

impl TransitionTiming {
    pub fn new(duration: Duration, curve: TimingCurve) -> Self {
        Self { duration, curve }
    }

    /// Convenience constructor from milliseconds
    pub fn from_millis(millis: u64, curve: TimingCurve) -> Self {
        Self::new(Duration::from_millis(millis), curve)
    }

    /// A transition that settles immediately
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, TimingCurve::Linear)
    }
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self::from_millis(300, TimingCurve::EaseInEaseOut)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Transient visual properties animated by transitions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// Window alpha in `[0, 1]`
    pub opacity: f64,
    /// Uniform content scale around the frame center
    pub scale: f64,
}

impl Appearance {
    /// Full opacity, unit scale. The baseline of an ordered-out window.
    pub const IDENTITY: Appearance = Appearance {
        opacity: 1.0,
        scale: 1.0,
    };

    /// Fully transparent, unit scale
    pub const TRANSPARENT: Appearance = Appearance {
        opacity: 0.0,
        scale: 1.0,
    };

    pub fn new(opacity: f64, scale: f64) -> Self {
        Self { opacity, scale }
    }

    /// Interpolate toward `target` by eased progress `t`
    pub fn lerp(&self, target: &Appearance, t: f64) -> Appearance {
        Appearance {
            opacity: self.opacity + (target.opacity - self.opacity) * t,
            scale: self.scale + (target.scale - self.scale) * t,
        }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hidden and visible end states plus the timing between them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Appearance the panel starts from on present and ends at on dismiss
    pub hidden: Appearance,
    /// Appearance of a presented panel
    pub visible: Appearance,
    /// Hidden to visible
    pub enter: TransitionTiming,
    /// Visible to hidden
    pub exit: TransitionTiming,
}

impl Presentation {
    /// Plain opacity fade with the given timings
    pub fn fade(enter: TransitionTiming, exit: TransitionTiming) -> Self {
        Self {
            hidden: Appearance::TRANSPARENT,
            visible: Appearance::IDENTITY,
            enter,
            exit,
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::fade(TransitionTiming::default(), TransitionTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_hit_endpoints() {
        for curve in [
            TimingCurve::Linear,
            TimingCurve::EaseIn,
            TimingCurve::EaseOut,
            TimingCurve::EaseInEaseOut,
        ] {
            assert!(curve.sample(0.0).abs() < 1e-3, "{:?} at 0", curve);
            assert!((curve.sample(1.0) - 1.0).abs() < 1e-3, "{:?} at 1", curve);
        }
    }

    #[test]
    fn test_ease_in_starts_slow() {
        assert!(TimingCurve::EaseIn.sample(0.25) < 0.25);
        assert!(TimingCurve::EaseOut.sample(0.25) > 0.25);
    }

    #[test]
    fn test_ease_in_out_is_symmetric_at_midpoint() {
        assert!((TimingCurve::EaseInEaseOut.sample(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_appearance_lerp() {
        let mid = Appearance::TRANSPARENT.lerp(&Appearance::IDENTITY, 0.5);
        assert_eq!(mid, Appearance::new(0.5, 1.0));
    }

    #[test]
    fn test_timing_yaml_uses_millis() {
        let timing: TransitionTiming =
            serde_yaml::from_str("duration_ms: 250\ncurve: ease_out\n").unwrap();
        assert_eq!(timing.duration, Duration::from_millis(250));
        assert_eq!(timing.curve, TimingCurve::EaseOut);
    }
}
