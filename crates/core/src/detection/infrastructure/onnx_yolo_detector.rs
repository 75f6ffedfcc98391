//! YOLO face-pose detector running on ONNX Runtime via `ort`.
//!
//! Letterboxes the frame into the model's square input, runs inference,
//! suppresses overlapping boxes and reports normalized observations.

use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::face_observation::FaceObservation;
use crate::detection::error::DetectionError;
use crate::shared::frame::Frame;
use crate::shared::geometry::{NormalizedRect, Size};

use super::execution_provider::{intra_op_threads, preferred_execution_providers};

/// Fallback model input resolution when the model doesn't specify one.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.25;

const NMS_IOU_THRESH: f64 = 0.45;

/// Box (4) + score (1) + five keypoints of (x, y, conf).
const ROW_WITH_KEYPOINTS: usize = 5 + 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Letterbox padding value, the YOLO convention.
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Loads the model and reads its input resolution from the NCHW input
    /// shape, falling back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, DetectionError> {
        let session = ort::session::Session::builder()
            .map_err(DetectionError::runtime)?
            .with_inter_threads(1)
            .map_err(DetectionError::runtime)?
            .with_intra_threads(intra_op_threads())
            .map_err(DetectionError::runtime)?
            .with_execution_providers(preferred_execution_providers())
            .map_err(DetectionError::runtime)?
            .commit_from_file(model_path)
            .map_err(DetectionError::runtime)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded face model {} (input {input_size}px, confidence {confidence})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>, DetectionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectionError::UnsupportedFrame {
                width: frame.width(),
                height: frame.height(),
            });
        }

        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value =
            ort::value::Tensor::from_array(input_tensor).map_err(DetectionError::runtime)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(DetectionError::runtime)?;
        if outputs.len() == 0 {
            return Err(DetectionError::UnexpectedOutput(
                "model produced no outputs".to_string(),
            ));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(DetectionError::runtime)?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or_else(|| {
            DetectionError::UnexpectedOutput("output tensor is not contiguous".to_string())
        })?;

        let mut raw = decode_rows(data, &shape, self.confidence, &letterbox)?;
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        let size = Size::new(frame.width() as f64, frame.height() as f64);
        Ok(kept.iter().map(|d| d.to_observation(size)).collect())
    }
}

/// Maps model-input pixels back to source-frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_source(self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Nearest-neighbour resize into a `target_size` square, centred and padded,
/// as an NCHW float tensor in RGB order.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let side = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, side, side), PAD_VALUE);

    let src = frame.as_ndarray();
    let offsets = frame.format().rgb_offsets();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        let ty = pad_y as usize + y;
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let tx = pad_x as usize + x;
            for (c, &offset) in offsets.iter().enumerate() {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, offset]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

#[derive(Clone, Debug)]
struct RawDetection {
    /// Source-frame pixels.
    bbox: [f64; 4],
    confidence: f64,
    keypoints: Option<[Option<(f64, f64)>; 5]>,
}

impl RawDetection {
    fn to_observation(&self, size: Size) -> FaceObservation {
        let [x1, y1, x2, y2] = self.bbox;
        let observation = FaceObservation::new(
            NormalizedRect::from_corners(x1, y1, x2, y2, size),
            self.confidence,
        );
        match self.keypoints {
            Some(points) => observation.with_landmarks(FaceLandmarks::new(points.map(|p| {
                p.map(|(x, y)| {
                    (
                        (x / size.width).clamp(0.0, 1.0),
                        (y / size.height).clamp(0.0, 1.0),
                    )
                })
            }))),
            None => observation,
        }
    }
}

/// Parses raw output rows `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
///
/// The output is `[1, features, detections]` or `[1, detections, features]`;
/// the smaller axis is taken as the feature axis.
fn decode_rows(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "expected a rank-3 output, got shape {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 || data.len() < num_dets * num_feats {
        return Err(DetectionError::UnexpectedOutput(format!(
            "output shape {shape:?} does not hold detection rows"
        )));
    }

    let value = |det: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[i] as f64
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < confidence {
            continue;
        }

        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);

        let keypoints = (num_feats >= ROW_WITH_KEYPOINTS).then(|| {
            std::array::from_fn(|k| {
                let base = 5 + k * 3;
                (value(i, base + 2) >= KEYPOINT_CONF_THRESH)
                    .then(|| letterbox.to_source(value(i, base), value(i, base + 1)))
            })
        });

        dets.push(RawDetection {
            bbox: [x1, y1, x2, y2],
            confidence: conf,
            keypoints,
        });
    }
    Ok(dets)
}

/// Greedy NMS: highest confidence first, suppressing boxes that overlap a
/// kept one by more than `iou_thresh`.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        if keep
            .iter()
            .all(|kept| bbox_iou(&kept.bbox, &det.bbox) <= iou_thresh)
        {
            keep.push(det.clone());
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::Landmark;
    use crate::shared::frame::PixelFormat;
    use approx::assert_relative_eq;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    fn raw(bbox: [f64; 4], confidence: f64) -> RawDetection {
        RawDetection {
            bbox,
            confidence,
            keypoints: None,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → scale 3.2, content 640x320, 160px bands top and bottom
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, PixelFormat::Rgb24, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_reads_bgra_as_rgb() {
        // Pure red in BGRA byte order.
        let data = [0u8, 0, 255, 255].repeat(4 * 2);
        let frame = Frame::new(data, 4, 2, PixelFormat::Bgra32, 0);
        let (tensor, lb) = letterbox(&frame, 8);

        let (y, x) = (lb.pad_y as usize + 1, lb.pad_x as usize + 1);
        assert_relative_eq!(tensor[[0, 0, y, x]], 1.0);
        assert_relative_eq!(tensor[[0, 1, y, x]], 0.0);
        assert_relative_eq!(tensor[[0, 2, y, x]], 0.0);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], PAD_VALUE);
    }

    #[test]
    fn test_letterbox_maps_back_to_source() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        assert_eq!(lb.to_source(40.0, 140.0), (20.0, 20.0));
    }

    /// `[1, rows, features]` with every row after `first` zeroed.
    fn row_major(first: &[f32], rows: usize) -> Vec<f32> {
        let mut data = first.to_vec();
        data.resize(first.len() * rows, 0.0);
        data
    }

    #[test]
    fn test_decode_rows_filters_by_confidence() {
        // [1, 6 detections, 5 features]
        let mut data = row_major(&[50.0, 50.0, 20.0, 20.0, 0.9], 6);
        data[5..10].copy_from_slice(&[10.0, 10.0, 4.0, 4.0, 0.1]);
        let dets = decode_rows(&data, &[1, 6, 5], 0.25, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, [40.0, 40.0, 60.0, 60.0]);
        assert!(dets[0].keypoints.is_none());
    }

    #[test]
    fn test_decode_rows_reads_transposed_layout() {
        // [1, 5 features, 3 detections]: one column per detection
        let data = [
            10.0, 20.0, 30.0, // cx
            10.0, 20.0, 30.0, // cy
            2.0, 2.0, 2.0, // w
            2.0, 2.0, 2.0, // h
            0.3, 0.8, 0.1, // conf
        ];
        let dets = decode_rows(&data, &[1, 5, 3], 0.25, &IDENTITY).unwrap();
        let centers: Vec<f64> = dets.iter().map(|d| d.bbox[0] + 1.0).collect();
        assert_eq!(centers, vec![10.0, 20.0]);
    }

    #[test]
    fn test_decode_rows_drops_low_confidence_keypoints() {
        let mut row = vec![50.0f32, 50.0, 20.0, 20.0, 0.9];
        for k in 0..5 {
            let conf = if k == 3 { 0.1 } else { 0.9 };
            row.extend_from_slice(&[40.0 + k as f32, 45.0, conf]);
        }
        let data = row_major(&row, 32);
        let dets = decode_rows(&data, &[1, 32, 20], 0.25, &IDENTITY).unwrap();
        let keypoints = dets[0].keypoints.unwrap();
        assert_eq!(keypoints[0], Some((40.0, 45.0)));
        assert_eq!(keypoints[3], None);
    }

    #[test]
    fn test_decode_rows_rejects_bad_shape() {
        assert!(matches!(
            decode_rows(&[0.0; 4], &[4], 0.25, &IDENTITY),
            Err(DetectionError::UnexpectedOutput(_))
        ));
        assert!(matches!(
            decode_rows(&[0.0; 24], &[1, 8, 3], 0.25, &IDENTITY),
            Err(DetectionError::UnexpectedOutput(_))
        ));
    }

    #[test]
    fn test_observation_is_normalized_to_frame() {
        let mut det = raw([50.0, 25.0, 150.0, 75.0], 0.8);
        let mut points = [None; 5];
        points[2] = Some((100.0, 50.0));
        det.keypoints = Some(points);

        let obs = det.to_observation(Size::new(200.0, 100.0));
        assert_eq!(obs.bounding_box, NormalizedRect::new(0.25, 0.25, 0.5, 0.5));
        assert_relative_eq!(obs.confidence, 0.8);
        assert_eq!(obs.landmarks.point(Landmark::Nose), Some((0.5, 0.5)));
        assert_eq!(obs.landmarks.visible_count(), 1);
    }

    #[test]
    fn test_nms_keeps_highest_of_overlapping_pair() {
        let mut dets = vec![
            raw([0.0, 0.0, 100.0, 100.0], 0.5),
            raw([2.0, 2.0, 102.0, 102.0], 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_separate_faces() {
        let mut dets = vec![
            raw([0.0, 0.0, 50.0, 50.0], 0.9),
            raw([200.0, 200.0, 250.0, 250.0], 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
        assert!(nms(&mut [], 0.3).is_empty());
    }

    #[test]
    fn test_bbox_iou() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&b, &b), 1.0);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }
}
