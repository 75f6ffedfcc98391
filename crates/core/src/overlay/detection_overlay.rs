use std::time::Instant;

use crossbeam_channel::Sender;

use crate::capture::domain::frame_delegate::FrameDelegate;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::image_orientation::ImageOrientation;
use crate::overlay::overlay_event::OverlayEvent;
use crate::pipeline::failure_policy::FailurePolicy;
use crate::pipeline::session_logger::SharedSessionLogger;
use crate::shared::frame::Frame;

/// Frame delegate that runs one detection pass per admitted frame and hands
/// the result to the UI thread.
///
/// Detection runs on the upright frame; results are mapped back onto the
/// delivered frame before they are sent, since that is what the preview
/// shows. A failed pass still reports an empty result, so the overlay
/// clears instead of showing stale highlights.
pub struct DetectionOverlay {
    detector: Box<dyn FaceDetector>,
    orientation: ImageOrientation,
    policy: FailurePolicy,
    events: Sender<OverlayEvent>,
    logger: SharedSessionLogger,
}

impl DetectionOverlay {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        orientation: ImageOrientation,
        policy: FailurePolicy,
        events: Sender<OverlayEvent>,
        logger: SharedSessionLogger,
    ) -> Self {
        Self {
            detector,
            orientation,
            policy,
            events,
            logger,
        }
    }
}

impl FrameDelegate for DetectionOverlay {
    fn on_frame(&mut self, frame: &Frame) {
        let t0 = Instant::now();
        let oriented;
        let input = if self.orientation == ImageOrientation::Up {
            frame
        } else {
            oriented = self.orientation.upright(frame);
            &oriented
        };
        let orient_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        let faces = match self.detector.detect(input) {
            Ok(faces) => faces
                .into_iter()
                .map(|face| self.orientation.observation_to_source(face))
                .collect(),
            Err(e) => {
                self.policy
                    .handle(&format!("detection on frame {}", frame.index()), &e, &self.events);
                Vec::new()
            }
        };
        let detect_ms = t1.elapsed().as_secs_f64() * 1000.0;

        {
            let mut logger = self
                .logger
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if self.orientation != ImageOrientation::Up {
                logger.timing("orient", orient_ms);
            }
            logger.timing("detect", detect_ms);
            logger.frame_processed(frame.index(), faces.len());
        }

        let _ = self.events.send(OverlayEvent::FacesDetected {
            frame_index: frame.index(),
            faces,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_observation::FaceObservation;
    use crate::detection::error::DetectionError;
    use crate::overlay::highlight_shape::StrokeStyle;
    use crate::overlay::overlay_screen::OverlayScreen;
    use crate::overlay::preview_surface::PreviewGravity;
    use crate::pipeline::session_logger::{shared, NullSessionLogger};
    use crate::shared::frame::PixelFormat;
    use crate::shared::geometry::{NormalizedRect, ScreenRect};
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// Reports the frame's size as the single face's width, or fails.
    struct SizeEchoDetector {
        fail: bool,
    }

    impl FaceDetector for SizeEchoDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>, DetectionError> {
            if self.fail {
                return Err(DetectionError::Runtime("model crashed".to_string()));
            }
            Ok(vec![FaceObservation::new(
                NormalizedRect::new(0.0, 0.0, frame.width() as f64, frame.height() as f64),
                0.9,
            )])
        }
    }

    fn overlay(
        fail: bool,
        orientation: ImageOrientation,
        policy: FailurePolicy,
    ) -> (DetectionOverlay, crossbeam_channel::Receiver<OverlayEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let overlay = DetectionOverlay::new(
            Box::new(SizeEchoDetector { fail }),
            orientation,
            policy,
            tx,
            shared(NullSessionLogger),
        );
        (overlay, rx)
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0; 3 * 2 * 4], 3, 2, PixelFormat::Bgra32, index)
    }

    #[test]
    fn test_detected_faces_are_sent_with_frame_index() {
        let (mut overlay, rx) = overlay(false, ImageOrientation::Up, FailurePolicy::Silent);
        overlay.on_frame(&frame(4));

        match rx.try_recv().unwrap() {
            OverlayEvent::FacesDetected { frame_index, faces } => {
                assert_eq!(frame_index, 4);
                assert_eq!(faces.len(), 1);
                assert_eq!(faces[0].bounding_box.width, 3.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    /// Boxes the brightest pixel of the frame it is given.
    struct BrightestPixelDetector;

    impl FaceDetector for BrightestPixelDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>, DetectionError> {
            let channels = frame.channels() as usize;
            let (brightest, _) = frame
                .data()
                .chunks_exact(channels)
                .enumerate()
                .max_by_key(|(_, px)| px[0])
                .unwrap();
            let (w, h) = (frame.width() as f64, frame.height() as f64);
            let x = (brightest as u32 % frame.width()) as f64;
            let y = (brightest as u32 / frame.width()) as f64;
            Ok(vec![FaceObservation::new(
                NormalizedRect::new(x / w, y / h, 1.0 / w, 1.0 / h),
                0.9,
            )])
        }
    }

    /// 4x2 BGRA frame with one white pixel at `(x, y)`.
    fn marked_frame(x: usize, y: usize) -> Frame {
        let mut data = vec![0; 4 * 2 * 4];
        let at = (y * 4 + x) * 4;
        data[at..at + 4].fill(255);
        Frame::new(data, 4, 2, PixelFormat::Bgra32, 0)
    }

    fn detected_box(orientation: ImageOrientation, frame: &Frame) -> NormalizedRect {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut overlay = DetectionOverlay::new(
            Box::new(BrightestPixelDetector),
            orientation,
            FailurePolicy::Silent,
            tx,
            shared(NullSessionLogger),
        );
        overlay.on_frame(frame);
        let Ok(OverlayEvent::FacesDetected { faces, .. }) = rx.try_recv() else {
            panic!("expected faces");
        };
        faces[0].bounding_box
    }

    #[rstest]
    fn test_boxes_land_on_the_delivered_frame_for_every_orientation(
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
        #[values((0, 0), (3, 0), (1, 1))] marked: (usize, usize),
    ) {
        let rect = detected_box(orientation, &marked_frame(marked.0, marked.1));
        assert_relative_eq!(rect.x, marked.0 as f64 / 4.0, epsilon = 1e-9);
        assert_relative_eq!(rect.y, marked.1 as f64 / 2.0, epsilon = 1e-9);
        assert_relative_eq!(rect.width, 0.25, epsilon = 1e-9);
        assert_relative_eq!(rect.height, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_detection_highlights_the_marked_corner_on_screen() {
        let mut screen = OverlayScreen::new(
            ScreenRect::new(0.0, 0.0, 400.0, 200.0),
            PreviewGravity::Resize,
            StrokeStyle::default(),
            "FaceCam",
        );
        screen.handle(OverlayEvent::SessionStarted {
            width: 4,
            height: 2,
            rotation_degrees: 0,
        });

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut overlay = DetectionOverlay::new(
            Box::new(BrightestPixelDetector),
            ImageOrientation::LeftMirrored,
            FailurePolicy::Silent,
            tx,
            shared(NullSessionLogger),
        );
        overlay.on_frame(&marked_frame(0, 0));
        screen.handle(rx.try_recv().unwrap());

        assert_eq!(screen.shapes()[0].rect, ScreenRect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_silent_failure_reports_empty_result_only() {
        let (mut overlay, rx) = overlay(true, ImageOrientation::Up, FailurePolicy::Silent);
        overlay.on_frame(&frame(1));

        assert_eq!(
            rx.try_recv().unwrap(),
            OverlayEvent::FacesDetected {
                frame_index: 1,
                faces: Vec::new()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reported_failure_precedes_empty_result() {
        let (mut overlay, rx) = overlay(true, ImageOrientation::Up, FailurePolicy::Report);
        overlay.on_frame(&frame(2));

        assert!(matches!(rx.try_recv().unwrap(), OverlayEvent::Diagnostic(msg) if msg.contains("model crashed")));
        assert!(matches!(
            rx.try_recv().unwrap(),
            OverlayEvent::FacesDetected { faces, .. } if faces.is_empty()
        ));
    }
}
