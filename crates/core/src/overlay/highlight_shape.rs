use crate::shared::constants::{HIGHLIGHT_LINE_WIDTH, HIGHLIGHT_STROKE_RGB};
use crate::shared::geometry::ScreenRect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineJoin {
    Miter,
    Round,
    #[default]
    Bevel,
}

/// Outline style shared by every highlight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub stroke: Rgb,
    /// `None` leaves the inside of the outline clear.
    pub fill: Option<Rgb>,
    pub line_width: f64,
    pub line_join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        let (r, g, b) = HIGHLIGHT_STROKE_RGB;
        Self {
            stroke: Rgb::new(r, g, b),
            fill: None,
            line_width: HIGHLIGHT_LINE_WIDTH,
            line_join: LineJoin::Bevel,
        }
    }
}

/// One on-screen outline around a detected face.
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightShape {
    pub rect: ScreenRect,
    pub style: StrokeStyle,
}

impl HighlightShape {
    pub fn new(rect: ScreenRect, style: StrokeStyle) -> Self {
        Self { rect, style }
    }

    pub fn has_visible_stroke(&self) -> bool {
        self.style.line_width > 0.0
    }

    pub fn is_filled(&self) -> bool {
        self.style.fill.is_some()
    }
}
