//! Five facial landmarks in normalized image coordinates.

/// Landmark order produced by five-point face models.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landmark {
    LeftEye,
    RightEye,
    Nose,
    LeftMouth,
    RightMouth,
}

impl Landmark {
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct FaceLandmarks {
    /// `None` for landmarks the model was not confident about.
    points: [Option<(f64, f64)>; 5],
}

impl FaceLandmarks {
    pub fn new(points: [Option<(f64, f64)>; 5]) -> Self {
        Self { points }
    }

    pub fn point(&self, landmark: Landmark) -> Option<(f64, f64)> {
        self.points[landmark.index()]
    }

    pub fn visible_count(&self) -> usize {
        self.points.iter().flatten().count()
    }

    /// Moves every visible point through `f`.
    pub fn mapped(&self, f: impl Fn((f64, f64)) -> (f64, f64)) -> Self {
        Self {
            points: self.points.map(|p| p.map(&f)),
        }
    }
}
