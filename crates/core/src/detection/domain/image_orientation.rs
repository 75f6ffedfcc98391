use std::fmt;
use std::str::FromStr;

use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;
use crate::shared::geometry::NormalizedRect;

/// How the stored pixels relate to the upright scene, using the EXIF
/// convention: the variant names where the first row of pixels ends up.
///
/// The detector works on the upright image, so its results are normalized
/// to the frame returned by [`ImageOrientation::upright`]. Use
/// [`ImageOrientation::to_source`] to bring them back onto the stored frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ImageOrientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    Left,
    LeftMirrored,
    Right,
    RightMirrored,
}

impl ImageOrientation {
    pub const ALL: [ImageOrientation; 8] = [
        ImageOrientation::Up,
        ImageOrientation::UpMirrored,
        ImageOrientation::Down,
        ImageOrientation::DownMirrored,
        ImageOrientation::Left,
        ImageOrientation::LeftMirrored,
        ImageOrientation::Right,
        ImageOrientation::RightMirrored,
    ];

    /// Turns `frame` so the scene reads upright.
    pub fn upright(self, frame: &Frame) -> Frame {
        match self {
            ImageOrientation::Up => frame.clone(),
            ImageOrientation::UpMirrored => frame.mirrored(),
            ImageOrientation::Down => frame.rotated(180),
            ImageOrientation::DownMirrored => frame.rotated(180).mirrored(),
            ImageOrientation::Left => frame.rotated(270),
            ImageOrientation::LeftMirrored => frame.rotated(90).mirrored(),
            ImageOrientation::Right => frame.rotated(90),
            ImageOrientation::RightMirrored => frame.rotated(270).mirrored(),
        }
    }

    /// Maps a unit-space point on the upright frame back onto the stored
    /// frame.
    pub fn source_point(self, (u, v): (f64, f64)) -> (f64, f64) {
        match self {
            ImageOrientation::Up => (u, v),
            ImageOrientation::UpMirrored => (1.0 - u, v),
            ImageOrientation::Down => (1.0 - u, 1.0 - v),
            ImageOrientation::DownMirrored => (u, 1.0 - v),
            ImageOrientation::Left => (1.0 - v, u),
            ImageOrientation::LeftMirrored => (v, u),
            ImageOrientation::Right => (v, 1.0 - u),
            ImageOrientation::RightMirrored => (1.0 - v, 1.0 - u),
        }
    }

    /// Maps a unit-space box on the upright frame back onto the stored frame.
    pub fn to_source(self, rect: NormalizedRect) -> NormalizedRect {
        let (x1, y1) = self.source_point((rect.x, rect.y));
        let (x2, y2) = self.source_point((rect.x + rect.width, rect.y + rect.height));
        NormalizedRect::new(
            x1.min(x2),
            y1.min(y2),
            (x2 - x1).abs(),
            (y2 - y1).abs(),
        )
    }

    /// Box and landmarks of `face` in stored-frame coordinates.
    pub fn observation_to_source(self, face: FaceObservation) -> FaceObservation {
        if self == ImageOrientation::Up {
            return face;
        }
        FaceObservation {
            bounding_box: self.to_source(face.bounding_box),
            landmarks: face.landmarks.mapped(|p| self.source_point(p)),
            ..face
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ImageOrientation::Up => "up",
            ImageOrientation::UpMirrored => "up-mirrored",
            ImageOrientation::Down => "down",
            ImageOrientation::DownMirrored => "down-mirrored",
            ImageOrientation::Left => "left",
            ImageOrientation::LeftMirrored => "left-mirrored",
            ImageOrientation::Right => "right",
            ImageOrientation::RightMirrored => "right-mirrored",
        }
    }
}

impl fmt::Display for ImageOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.name() == s)
            .ok_or_else(|| format!("unknown orientation: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// 3x2 RGB frame whose red channel numbers the pixels row by row:
    /// 0 1 2
    /// 3 4 5
    fn numbered() -> Frame {
        let data = (0u8..6).flat_map(|i| [i, 0, 0]).collect();
        Frame::new(data, 3, 2, PixelFormat::Rgb24, 0)
    }

    fn reds(frame: &Frame) -> Vec<u8> {
        frame.data().chunks_exact(3).map(|px| px[0]).collect()
    }

    #[rstest]
    #[case(ImageOrientation::Up, (3, 2), vec![0, 1, 2, 3, 4, 5])]
    #[case(ImageOrientation::UpMirrored, (3, 2), vec![2, 1, 0, 5, 4, 3])]
    #[case(ImageOrientation::Down, (3, 2), vec![5, 4, 3, 2, 1, 0])]
    #[case(ImageOrientation::DownMirrored, (3, 2), vec![3, 4, 5, 0, 1, 2])]
    #[case(ImageOrientation::Right, (2, 3), vec![3, 0, 4, 1, 5, 2])]
    #[case(ImageOrientation::Left, (2, 3), vec![2, 5, 1, 4, 0, 3])]
    #[case(ImageOrientation::LeftMirrored, (2, 3), vec![0, 3, 1, 4, 2, 5])]
    #[case(ImageOrientation::RightMirrored, (2, 3), vec![5, 2, 4, 1, 3, 0])]
    fn test_upright(
        #[case] orientation: ImageOrientation,
        #[case] size: (u32, u32),
        #[case] expected: Vec<u8>,
    ) {
        let out = orientation.upright(&numbered());
        assert_eq!((out.width(), out.height()), size);
        assert_eq!(reds(&out), expected);
    }

    /// Unit-space centre of the pixel at `(x, y)` in a `w`x`h` frame.
    fn centre(x: u32, y: u32, w: u32, h: u32) -> (f64, f64) {
        ((x as f64 + 0.5) / w as f64, (y as f64 + 0.5) / h as f64)
    }

    #[rstest]
    fn test_source_point_finds_the_pixel_it_came_from(
        #[values(
            ImageOrientation::Up,
            ImageOrientation::UpMirrored,
            ImageOrientation::Down,
            ImageOrientation::DownMirrored,
            ImageOrientation::Left,
            ImageOrientation::LeftMirrored,
            ImageOrientation::Right,
            ImageOrientation::RightMirrored
        )]
        orientation: ImageOrientation,
    ) {
        let upright = orientation.upright(&numbered());
        let (w, h) = (upright.width(), upright.height());
        for (i, red) in reds(&upright).into_iter().enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            let (u, v) = orientation.source_point(centre(x, y, w, h));
            let (sx, sy) = ((u * 3.0).floor() as u8, (v * 2.0).floor() as u8);
            assert_eq!(sy * 3 + sx, red, "{orientation} pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_to_source_swaps_axes_for_quarter_turns() {
        let upright_box = NormalizedRect::new(0.0, 0.0, 0.5, 0.25);
        let rect = ImageOrientation::LeftMirrored.to_source(upright_box);
        assert_relative_eq!(rect.x, 0.0);
        assert_relative_eq!(rect.y, 0.0);
        assert_relative_eq!(rect.width, 0.25);
        assert_relative_eq!(rect.height, 0.5);

        let rect = ImageOrientation::Right.to_source(upright_box);
        assert_relative_eq!(rect.x, 0.0);
        assert_relative_eq!(rect.y, 0.5);
        assert_relative_eq!(rect.width, 0.25);
        assert_relative_eq!(rect.height, 0.5);
    }

    #[test]
    fn test_up_leaves_observations_untouched() {
        let face = FaceObservation::new(NormalizedRect::new(0.1, 0.2, 0.3, 0.4), 0.8);
        assert_eq!(ImageOrientation::Up.observation_to_source(face.clone()), face);
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for orientation in ImageOrientation::ALL {
            assert_eq!(orientation.name().parse::<ImageOrientation>(), Ok(orientation));
        }
        assert!("sideways".parse::<ImageOrientation>().is_err());
    }
}
