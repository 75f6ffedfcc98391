pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Directory name used under the platform cache and config dirs.
pub const APP_DIR_NAME: &str = "FaceCam";

/// Fixed clockwise correction applied to captured frames and the preview.
///
/// Not recomputed when the device rotates.
pub const VIDEO_ROTATION_DEGREES: u32 = 90;

/// Label of the background queue that configures the session and receives frames.
pub const SESSION_QUEUE_LABEL: &str = "sessionQueue";

pub const HIGHLIGHT_LINE_WIDTH: f64 = 1.33;

/// Stroke color of face highlights (sRGB yellow).
pub const HIGHLIGHT_STROKE_RGB: (u8, u8, u8) = (255, 204, 0);

pub const DEFAULT_CAPTION: &str = "FaceCam";
