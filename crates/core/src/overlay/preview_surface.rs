use std::fmt;
use std::str::FromStr;

use crate::shared::geometry::{NormalizedRect, ScreenRect, Size};

/// How video is fitted into the preview bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PreviewGravity {
    /// Stretch to fill the bounds exactly.
    Resize,
    /// Fit inside the bounds, letterboxed.
    ResizeAspect,
    /// Cover the bounds, cropping the overflow.
    #[default]
    ResizeAspectFill,
}

impl PreviewGravity {
    pub const ALL: [PreviewGravity; 3] = [
        PreviewGravity::Resize,
        PreviewGravity::ResizeAspect,
        PreviewGravity::ResizeAspectFill,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PreviewGravity::Resize => "resize",
            PreviewGravity::ResizeAspect => "aspect",
            PreviewGravity::ResizeAspectFill => "aspect-fill",
        }
    }
}

impl fmt::Display for PreviewGravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PreviewGravity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| format!("unknown preview gravity: {s}"))
    }
}

/// The on-screen rectangle the camera preview is drawn into.
///
/// Owns the mapping from the detector's unit space to screen space, so
/// highlights line up with the video whatever the bounds and gravity.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewSurface {
    bounds: ScreenRect,
    gravity: PreviewGravity,
    rotation_degrees: u32,
    /// Native camera size, before rotation. `None` until the session starts.
    video_size: Option<Size>,
}

impl PreviewSurface {
    pub fn new(bounds: ScreenRect, gravity: PreviewGravity) -> Self {
        Self {
            bounds,
            gravity,
            rotation_degrees: 0,
            video_size: None,
        }
    }

    pub fn bounds(&self) -> ScreenRect {
        self.bounds
    }

    /// Takes effect for the next mapped rectangle; shapes already drawn
    /// are not moved.
    pub fn set_bounds(&mut self, bounds: ScreenRect) {
        self.bounds = bounds;
    }

    pub fn gravity(&self) -> PreviewGravity {
        self.gravity
    }

    pub fn rotation(&self) -> u32 {
        self.rotation_degrees
    }

    /// Fixed clockwise correction between the camera and the screen.
    pub fn set_rotation(&mut self, degrees: u32) {
        self.rotation_degrees = degrees % 360;
    }

    pub fn set_video_dimensions(&mut self, width: u32, height: u32) {
        self.video_size = Some(Size::new(width as f64, height as f64));
    }

    /// Video size as shown on screen, after rotation.
    pub fn displayed_video_size(&self) -> Option<Size> {
        let size = self.video_size?;
        if (self.rotation_degrees / 90) % 2 == 1 {
            Some(size.transposed())
        } else {
            Some(size)
        }
    }

    /// Where the video itself lands. Equal to the bounds for `Resize` or
    /// while the video size is unknown; may overflow them for
    /// `ResizeAspectFill`.
    pub fn content_rect(&self) -> ScreenRect {
        let video = match self.displayed_video_size() {
            Some(size) if !size.is_empty() && !self.bounds.size().is_empty() => size,
            _ => return self.bounds,
        };

        let sx = self.bounds.width / video.width;
        let sy = self.bounds.height / video.height;
        let scale = match self.gravity {
            PreviewGravity::Resize => return self.bounds,
            PreviewGravity::ResizeAspect => sx.min(sy),
            PreviewGravity::ResizeAspectFill => sx.max(sy),
        };

        let width = video.width * scale;
        let height = video.height * scale;
        ScreenRect::new(
            self.bounds.x + (self.bounds.width - width) / 2.0,
            self.bounds.y + (self.bounds.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Maps a unit-space detection box to screen space.
    pub fn layer_rect_converted(&self, rect: NormalizedRect) -> ScreenRect {
        let content = self.content_rect();
        ScreenRect::new(
            content.x + rect.x * content.width,
            content.y + rect.y * content.height,
            rect.width * content.width,
            rect.height * content.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn surface(gravity: PreviewGravity) -> PreviewSurface {
        PreviewSurface::new(ScreenRect::new(0.0, 0.0, 400.0, 800.0), gravity)
    }

    fn assert_rect(actual: ScreenRect, expected: ScreenRect) {
        assert_relative_eq!(actual.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(actual.y, expected.y, epsilon = 1e-9);
        assert_relative_eq!(actual.width, expected.width, epsilon = 1e-9);
        assert_relative_eq!(actual.height, expected.height, epsilon = 1e-9);
    }

    #[rstest]
    #[case(PreviewGravity::Resize)]
    #[case(PreviewGravity::ResizeAspect)]
    #[case(PreviewGravity::ResizeAspectFill)]
    fn test_full_rect_maps_to_bounds_when_aspect_matches(#[case] gravity: PreviewGravity) {
        let mut surface = surface(gravity);
        // 1600x800 rotated a quarter turn is 800x1600, the bounds' shape.
        surface.set_rotation(90);
        surface.set_video_dimensions(1600, 800);

        let mapped = surface.layer_rect_converted(NormalizedRect::FULL);
        assert_rect(mapped, surface.bounds());
    }

    #[test]
    fn test_full_rect_maps_to_bounds_before_video_size_is_known() {
        let surface = surface(PreviewGravity::ResizeAspectFill);
        assert_rect(
            surface.layer_rect_converted(NormalizedRect::FULL),
            surface.bounds(),
        );
    }

    #[test]
    fn test_centre_quarter_covers_quarter_of_bounds() {
        let mut surface = surface(PreviewGravity::ResizeAspectFill);
        surface.set_video_dimensions(400, 800);

        let mapped = surface.layer_rect_converted(NormalizedRect::new(0.25, 0.25, 0.5, 0.5));
        assert_rect(mapped, ScreenRect::new(100.0, 200.0, 200.0, 400.0));
        assert_relative_eq!(mapped.area(), surface.bounds().area() / 4.0);
    }

    #[test]
    fn test_aspect_letterboxes_wide_video() {
        let mut surface = surface(PreviewGravity::ResizeAspect);
        surface.set_video_dimensions(800, 400);

        // Fit: scale 0.5, content 400x200 centred vertically.
        assert_rect(
            surface.content_rect(),
            ScreenRect::new(0.0, 300.0, 400.0, 200.0),
        );
    }

    #[test]
    fn test_aspect_fill_overflows_bounds_for_wide_video() {
        let mut surface = surface(PreviewGravity::ResizeAspectFill);
        surface.set_video_dimensions(800, 400);

        // Cover: scale 2, content 1600x800 centred horizontally.
        let content = surface.content_rect();
        assert_rect(content, ScreenRect::new(-600.0, 0.0, 1600.0, 800.0));
        let mapped = surface.layer_rect_converted(NormalizedRect::FULL);
        assert!(mapped.width > surface.bounds().width);
    }

    #[test]
    fn test_resize_stretches_regardless_of_video() {
        let mut surface = surface(PreviewGravity::Resize);
        surface.set_video_dimensions(800, 400);
        assert_rect(surface.content_rect(), surface.bounds());
    }

    #[test]
    fn test_bounds_offset_is_applied() {
        let mut surface = PreviewSurface::new(
            ScreenRect::new(10.0, 20.0, 100.0, 100.0),
            PreviewGravity::Resize,
        );
        let mapped = surface.layer_rect_converted(NormalizedRect::new(0.5, 0.5, 0.1, 0.1));
        assert_rect(mapped, ScreenRect::new(60.0, 70.0, 10.0, 10.0));

        surface.set_bounds(ScreenRect::new(0.0, 0.0, 200.0, 200.0));
        let mapped = surface.layer_rect_converted(NormalizedRect::new(0.5, 0.5, 0.1, 0.1));
        assert_rect(mapped, ScreenRect::new(100.0, 100.0, 20.0, 20.0));
    }

    #[test]
    fn test_rotation_transposes_displayed_size() {
        let mut surface = surface(PreviewGravity::ResizeAspectFill);
        surface.set_video_dimensions(1920, 1080);
        assert_eq!(
            surface.displayed_video_size(),
            Some(Size::new(1920.0, 1080.0))
        );
        surface.set_rotation(450);
        assert_eq!(surface.rotation(), 90);
        assert_eq!(
            surface.displayed_video_size(),
            Some(Size::new(1080.0, 1920.0))
        );
    }

    #[test]
    fn test_gravity_names_parse() {
        for gravity in PreviewGravity::ALL {
            assert_eq!(gravity.name().parse::<PreviewGravity>(), Ok(gravity));
        }
        assert!("stretch".parse::<PreviewGravity>().is_err());
    }
}
