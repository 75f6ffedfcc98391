use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facecam_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use facecam_core::overlay::highlight_shape::{Rgb, StrokeStyle};
use facecam_core::overlay::preview_surface::PreviewGravity;
use facecam_core::permission::domain::authorization::AuthorizationState;
use facecam_core::pipeline::failure_policy::FailurePolicy;
use facecam_core::shared::constants::{APP_DIR_NAME, DEFAULT_CAPTION, VIDEO_ROTATION_DEGREES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub caption: String,
    /// `#rrggbb`.
    pub stroke_color: String,
    pub line_width: f64,
    /// One of `resize`, `aspect`, `aspect-fill`.
    pub gravity: String,
    pub rotation: u32,
    /// Percent.
    pub confidence: u32,
    /// `silent` or `report`.
    pub policy: String,
    /// Camera identifier; `None` picks the first camera found.
    pub device: Option<String>,
    /// Remembered answer to the camera prompt.
    pub camera_access: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        let style = StrokeStyle::default();
        Self {
            caption: DEFAULT_CAPTION.to_string(),
            stroke_color: style.stroke.to_hex(),
            line_width: style.line_width,
            gravity: PreviewGravity::default().name().to_string(),
            rotation: VIDEO_ROTATION_DEGREES,
            confidence: (DEFAULT_CONFIDENCE * 100.0).round() as u32,
            policy: FailurePolicy::default().name().to_string(),
            device: None,
            camera_access: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            self.save_to(&path);
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::warn!("Could not save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Could not encode settings: {e}"),
        }
    }

    /// Highlight style; an unreadable color falls back to the default
    /// stroke.
    pub fn stroke_style(&self) -> StrokeStyle {
        let default = StrokeStyle::default();
        StrokeStyle {
            stroke: Rgb::from_hex(&self.stroke_color).unwrap_or(default.stroke),
            line_width: if self.line_width > 0.0 {
                self.line_width
            } else {
                default.line_width
            },
            ..default
        }
    }

    pub fn gravity(&self) -> PreviewGravity {
        self.gravity.parse().unwrap_or_default()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy.parse().unwrap_or_default()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.min(100) as f64 / 100.0
    }

    /// Rounded down to a quarter turn.
    pub fn rotation(&self) -> u32 {
        (self.rotation % 360) / 90 * 90
    }

    pub fn authorization(&self) -> AuthorizationState {
        match self.camera_access {
            Some(granted) => AuthorizationState::from_answer(granted),
            None => AuthorizationState::Undetermined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecam_core::overlay::highlight_shape::LineJoin;

    #[test]
    fn test_defaults_match_live_view() {
        let settings = Settings::default();
        assert_eq!(settings.caption, "FaceCam");
        assert_eq!(settings.stroke_style(), StrokeStyle::default());
        assert_eq!(settings.gravity(), PreviewGravity::ResizeAspectFill);
        assert_eq!(settings.policy(), FailurePolicy::Silent);
        assert_eq!(settings.rotation(), 90);
        assert_eq!(settings.confidence, 25);
        assert_eq!(settings.authorization(), AuthorizationState::Undetermined);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "caption": "Hello", "camera_access": false }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.caption, "Hello");
        assert_eq!(settings.authorization(), AuthorizationState::Denied);
        assert_eq!(settings.line_width, StrokeStyle::default().line_width);
    }

    #[test]
    fn test_corrupt_or_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());

        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_saved_consent_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            camera_access: Some(true),
            ..Settings::default()
        };
        settings.save_to(&path);

        assert_eq!(
            Settings::load_from(&path).authorization(),
            AuthorizationState::Granted
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = Settings {
            stroke_color: "yellow".to_string(),
            line_width: 0.0,
            gravity: "sideways".to_string(),
            policy: "loud".to_string(),
            rotation: 100,
            confidence: 250,
            ..Settings::default()
        };
        let style = settings.stroke_style();
        assert_eq!(style.stroke, StrokeStyle::default().stroke);
        assert_eq!(style.line_width, StrokeStyle::default().line_width);
        assert_eq!(style.line_join, LineJoin::Bevel);
        assert_eq!(settings.gravity(), PreviewGravity::ResizeAspectFill);
        assert_eq!(settings.policy(), FailurePolicy::Silent);
        assert_eq!(settings.rotation(), 90);
        assert_eq!(settings.confidence(), 1.0);
    }

    #[test]
    fn test_custom_stroke_color() {
        let settings = Settings {
            stroke_color: "#ff0000".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.stroke_style().stroke, Rgb::new(255, 0, 0));
        assert!(settings.stroke_style().fill.is_none());
    }
}
