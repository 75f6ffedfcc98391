/// Width and height in screen points or pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0.0 {
            0.0
        } else {
            self.width / self.height
        }
    }

    /// Swaps width and height, as a quarter-turn rotation does.
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// A rectangle in unit space: `(0, 0)` is the top-left corner of the image,
/// `(1, 1)` the bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub const FULL: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a unit-space rect from pixel corners inside an image of `size`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, size: Size) -> Self {
        if size.is_empty() {
            return Self::new(0.0, 0.0, 0.0, 0.0);
        }
        let x1 = x1.clamp(0.0, size.width);
        let y1 = y1.clamp(0.0, size.height);
        let x2 = x2.clamp(0.0, size.width);
        let y2 = y2.clamp(0.0, size.height);
        Self::new(
            x1 / size.width,
            y1 / size.height,
            (x2 - x1).max(0.0) / size.width,
            (y2 - y1).max(0.0) / size.height,
        )
    }
}

/// A rectangle in screen space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_corners_normalizes_by_image_size() {
        let rect = NormalizedRect::from_corners(50.0, 25.0, 150.0, 75.0, Size::new(200.0, 100.0));
        assert_relative_eq!(rect.x, 0.25);
        assert_relative_eq!(rect.y, 0.25);
        assert_relative_eq!(rect.width, 0.5);
        assert_relative_eq!(rect.height, 0.5);
    }

    #[test]
    fn test_from_corners_clamps_to_image() {
        let rect = NormalizedRect::from_corners(-10.0, -10.0, 300.0, 50.0, Size::new(200.0, 100.0));
        assert_relative_eq!(rect.x, 0.0);
        assert_relative_eq!(rect.y, 0.0);
        assert_relative_eq!(rect.width, 1.0);
        assert_relative_eq!(rect.height, 0.5);
    }

    #[test]
    fn test_from_corners_with_empty_size_is_zero() {
        let rect = NormalizedRect::from_corners(1.0, 1.0, 2.0, 2.0, Size::default());
        assert_eq!(rect, NormalizedRect::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_size_helpers() {
        let size = Size::new(1920.0, 1080.0);
        assert_relative_eq!(size.aspect_ratio(), 16.0 / 9.0);
        assert_eq!(size.transposed(), Size::new(1080.0, 1920.0));
        assert!(!size.is_empty());
        assert!(Size::new(0.0, 10.0).is_empty());
    }

    #[test]
    fn test_screen_rect_extent() {
        let rect = ScreenRect::new(10.0, 20.0, 30.0, 40.0);
        assert_relative_eq!(rect.max_x(), 40.0);
        assert_relative_eq!(rect.max_y(), 60.0);
        assert_relative_eq!(rect.area(), 1200.0);
    }
}
