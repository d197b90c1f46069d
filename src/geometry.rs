//! Panel geometry engine
//!
//! Resolves a panel's target frame from its sizing and position strategies,
//! the available screen bounds and the measured content size.
//!
//! Coordinates follow the desktop convention of the host window system:
//! the origin is at the bottom-left corner and `y` grows upward.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Primitive types
// ============================================================================

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle (origin at bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rect from an origin and a size
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// True when either dimension is zero or negative
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// How the panel decides its size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingStrategy {
    /// Occupy the entire screen frame, ignoring content size
    FullScreen,
    /// A static size that never follows the content
    Fixed { width: f64, height: f64 },
    /// Follow the measured content size, optionally capped per axis.
    /// An absent cap means "up to the screen dimension".
    Adapting {
        max_width: Option<f64>,
        max_height: Option<f64>,
    },
}

/// Where the panel is placed on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStrategy {
    /// Centered on both axes
    Center,
    /// Horizontally centered, `offset` below the top edge
    Top(f64),
    /// Horizontally centered, `offset` above the bottom edge
    Bottom(f64),
    /// A fixed origin in screen space
    Absolute { x: f64, y: f64 },
    /// Keep whatever origin the window already has
    Ignore,
}

/// Smallest dimension an adapting panel may shrink to.
/// Measurement races can report zero before content has laid out.
pub const MIN_ADAPTING_DIMENSION: f64 = 1.0;

/// Compute the target frame of a panel.
///
/// `current_origin` is only consulted for [`PositionStrategy::Ignore`] with a
/// non full-screen sizing; a full-screen panel is always pinned to the
/// screen's bottom-left corner.
pub fn compute_frame(
    sizing: SizingStrategy,
    position: PositionStrategy,
    screen: Rect,
    measured_content: Size,
    current_origin: Point,
) -> Rect {
    let size = resolve_size(sizing, screen, measured_content);
    let origin = resolve_origin(sizing, position, screen, size, current_origin);
    Rect::from_origin_size(origin, size)
}

/// Resolve the target size for a sizing strategy
pub fn resolve_size(sizing: SizingStrategy, screen: Rect, measured_content: Size) -> Size {
    match sizing {
        SizingStrategy::FullScreen => screen.size(),
        SizingStrategy::Fixed { width, height } => Size::new(width, height),
        SizingStrategy::Adapting {
            max_width,
            max_height,
        } => {
            let width = clamp_dimension(measured_content.width, max_width.unwrap_or(screen.width));
            let height =
                clamp_dimension(measured_content.height, max_height.unwrap_or(screen.height));
            Size::new(width, height)
        }
    }
}

/// Clamp to `[MIN_ADAPTING_DIMENSION, max]`; the minimum wins if `max` is smaller.
fn clamp_dimension(measured: f64, max: f64) -> f64 {
    let measured = if measured.is_nan() { 0.0 } else { measured };
    measured.min(max).max(MIN_ADAPTING_DIMENSION)
}

/// Resolve the target origin for an already resolved size
pub fn resolve_origin(
    sizing: SizingStrategy,
    position: PositionStrategy,
    screen: Rect,
    size: Size,
    current_origin: Point,
) -> Point {
    match position {
        PositionStrategy::Center => Point::new(
            screen.mid_x() - size.width / 2.0,
            screen.mid_y() - size.height / 2.0,
        ),
        PositionStrategy::Top(offset) => Point::new(
            screen.mid_x() - size.width / 2.0,
            screen.max_y() - offset - size.height,
        ),
        PositionStrategy::Bottom(offset) => {
            Point::new(screen.mid_x() - size.width / 2.0, screen.min_y() + offset)
        }
        PositionStrategy::Absolute { x, y } => Point::new(x, y),
        PositionStrategy::Ignore => {
            if sizing == SizingStrategy::FullScreen {
                screen.origin()
            } else {
                current_origin
            }
        }
    }
}

// ============================================================================
// Textual forms (CLI and config shorthands)
// ============================================================================

/// Error returned when a strategy shorthand cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{input}': {reason}")]
pub struct ParseStrategyError {
    kind: &'static str,
    input: String,
    reason: &'static str,
}

impl ParseStrategyError {
    fn new(kind: &'static str, input: &str, reason: &'static str) -> Self {
        Self {
            kind,
            input: input.to_string(),
            reason,
        }
    }
}

/// Parse `WxH` where either side may be empty (`50x`, `x80`)
fn parse_optional_pair(s: &str) -> Option<(Option<f64>, Option<f64>)> {
    let (w, h) = s.split_once('x')?;
    let parse = |v: &str| -> Option<Option<f64>> {
        let v = v.trim();
        if v.is_empty() {
            Some(None)
        } else {
            v.parse::<f64>().ok().map(Some)
        }
    };
    Some((parse(w)?, parse(h)?))
}

/// Parse a `WxH` size such as `1440x900`
pub fn parse_size(s: &str) -> Result<Size, ParseStrategyError> {
    match parse_optional_pair(s) {
        Some((Some(width), Some(height))) => Ok(Size::new(width, height)),
        _ => Err(ParseStrategyError::new("size", s, "expected WIDTHxHEIGHT")),
    }
}

impl FromStr for SizingStrategy {
    type Err = ParseStrategyError;

    /// `full`, `fixed:WxH`, `adapt`, `adapt:Wx`, `adapt:xH`, `adapt:WxH`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };

        match (kind.to_ascii_lowercase().as_str(), arg) {
            ("full" | "fullscreen", None) => Ok(SizingStrategy::FullScreen),
            ("fixed", Some(arg)) => {
                let size = parse_size(arg)
                    .map_err(|_| ParseStrategyError::new("sizing", s, "expected fixed:WxH"))?;
                Ok(SizingStrategy::Fixed {
                    width: size.width,
                    height: size.height,
                })
            }
            ("adapt" | "adapting", None) => Ok(SizingStrategy::Adapting {
                max_width: None,
                max_height: None,
            }),
            ("adapt" | "adapting", Some(arg)) => {
                let (max_width, max_height) = parse_optional_pair(arg).ok_or_else(|| {
                    ParseStrategyError::new("sizing", s, "expected adapt:[W]x[H]")
                })?;
                Ok(SizingStrategy::Adapting {
                    max_width,
                    max_height,
                })
            }
            _ => Err(ParseStrategyError::new(
                "sizing",
                s,
                "expected full, fixed:WxH or adapt[:WxH]",
            )),
        }
    }
}

impl FromStr for PositionStrategy {
    type Err = ParseStrategyError;

    /// `center`, `top:N`, `bottom:N`, `abs:X,Y`, `ignore`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };
        let offset = |arg: &str| {
            arg.trim()
                .parse::<f64>()
                .map_err(|_| ParseStrategyError::new("position", s, "offset must be a number"))
        };

        match (kind.to_ascii_lowercase().as_str(), arg) {
            ("center", None) => Ok(PositionStrategy::Center),
            ("ignore", None) => Ok(PositionStrategy::Ignore),
            ("top", None) => Ok(PositionStrategy::Top(0.0)),
            ("top", Some(arg)) => Ok(PositionStrategy::Top(offset(arg)?)),
            ("bottom", None) => Ok(PositionStrategy::Bottom(0.0)),
            ("bottom", Some(arg)) => Ok(PositionStrategy::Bottom(offset(arg)?)),
            ("abs" | "absolute", Some(arg)) => {
                let (x, y) = arg
                    .split_once(',')
                    .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)))
                    .ok_or_else(|| ParseStrategyError::new("position", s, "expected abs:X,Y"))?;
                Ok(PositionStrategy::Absolute { x, y })
            }
            _ => Err(ParseStrategyError::new(
                "position",
                s,
                "expected center, top[:N], bottom[:N], abs:X,Y or ignore",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rect {
        Rect::new(0.0, 0.0, 1440.0, 900.0)
    }

    #[test]
    fn test_top_offset_measured_from_max_y() {
        let frame = compute_frame(
            SizingStrategy::Fixed {
                width: 400.0,
                height: 100.0,
            },
            PositionStrategy::Top(20.0),
            screen(),
            Size::ZERO,
            Point::ZERO,
        );

        assert_eq!(frame, Rect::new(520.0, 780.0, 400.0, 100.0));
    }

    #[test]
    fn test_bottom_offset_measured_from_min_y() {
        let bounds = Rect::new(0.0, 50.0, 1440.0, 850.0);
        let frame = compute_frame(
            SizingStrategy::Fixed {
                width: 400.0,
                height: 100.0,
            },
            PositionStrategy::Bottom(10.0),
            bounds,
            Size::ZERO,
            Point::ZERO,
        );

        assert_eq!(frame.origin(), Point::new(520.0, 60.0));
    }

    #[test]
    fn test_ignore_keeps_current_origin() {
        let frame = compute_frame(
            SizingStrategy::Fixed {
                width: 10.0,
                height: 10.0,
            },
            PositionStrategy::Ignore,
            screen(),
            Size::ZERO,
            Point::new(33.0, 44.0),
        );

        assert_eq!(frame.origin(), Point::new(33.0, 44.0));
    }

    #[test]
    fn test_ignore_with_full_screen_pins_to_screen_origin() {
        let bounds = Rect::new(1440.0, 0.0, 1920.0, 1080.0);
        let frame = compute_frame(
            SizingStrategy::FullScreen,
            PositionStrategy::Ignore,
            bounds,
            Size::ZERO,
            Point::new(5.0, 5.0),
        );

        assert_eq!(frame, bounds);
    }

    #[test]
    fn test_adapting_zero_measurement_clamps_to_one() {
        let size = resolve_size(
            SizingStrategy::Adapting {
                max_width: None,
                max_height: None,
            },
            screen(),
            Size::ZERO,
        );

        assert_eq!(size, Size::new(1.0, 1.0));
    }

    #[test]
    fn test_clamp_dimension_nan_is_minimum() {
        assert_eq!(clamp_dimension(f64::NAN, 100.0), 1.0);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1440x900").unwrap(), Size::new(1440.0, 900.0));
        assert!(parse_size("1440").is_err());
        assert!(parse_size("x900").is_err());
    }
}
