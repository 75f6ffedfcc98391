use crate::overlay::highlight_shape::{HighlightShape, StrokeStyle};
use crate::overlay::overlay_event::OverlayEvent;
use crate::overlay::overlay_layer::{LayerChange, OverlayLayer};
use crate::overlay::preview_surface::{PreviewGravity, PreviewSurface};
use crate::permission::domain::authorization::AuthorizationState;
use crate::shared::geometry::ScreenRect;

const MAX_DIAGNOSTICS: usize = 20;

/// Everything the live view draws, owned by the UI thread.
///
/// Front ends feed it the events they receive from the session and render
/// from its accessors; nothing else mutates the highlight shapes.
pub struct OverlayScreen {
    surface: PreviewSurface,
    layer: OverlayLayer,
    style: StrokeStyle,
    caption: String,
    authorization: AuthorizationState,
    running: bool,
    last_frame_index: Option<usize>,
    diagnostics: Vec<String>,
}

impl OverlayScreen {
    pub fn new(
        bounds: ScreenRect,
        gravity: PreviewGravity,
        style: StrokeStyle,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            surface: PreviewSurface::new(bounds, gravity),
            layer: OverlayLayer::new(),
            style,
            caption: caption.into(),
            authorization: AuthorizationState::Undetermined,
            running: false,
            last_frame_index: None,
            diagnostics: Vec::new(),
        }
    }

    /// Applies one event. Returns the layer change when highlights were
    /// replaced.
    pub fn handle(&mut self, event: OverlayEvent) -> Option<LayerChange> {
        match event {
            OverlayEvent::Authorization(state) => {
                self.authorization = state;
                None
            }
            OverlayEvent::SessionStarted {
                width,
                height,
                rotation_degrees,
            } => {
                self.authorization = AuthorizationState::Granted;
                self.running = true;
                self.surface.set_rotation(rotation_degrees);
                self.surface.set_video_dimensions(width, height);
                None
            }
            OverlayEvent::FacesDetected { frame_index, faces } => {
                self.last_frame_index = Some(frame_index);
                let shapes = faces
                    .iter()
                    .map(|face| {
                        HighlightShape::new(
                            self.surface.layer_rect_converted(face.bounding_box),
                            self.style,
                        )
                    })
                    .collect();
                Some(self.layer.replace_all(shapes))
            }
            OverlayEvent::Diagnostic(message) => {
                if self.diagnostics.len() == MAX_DIAGNOSTICS {
                    self.diagnostics.remove(0);
                }
                self.diagnostics.push(message);
                None
            }
        }
    }

    /// New screen geometry. Used for the next detection result.
    pub fn resize(&mut self, bounds: ScreenRect) {
        self.surface.set_bounds(bounds);
    }

    /// Marks the session stopped and clears the highlights.
    pub fn session_stopped(&mut self) {
        self.running = false;
        self.layer.clear();
    }

    pub fn shapes(&self) -> &[HighlightShape] {
        self.layer.shapes()
    }

    pub fn layer(&self) -> &OverlayLayer {
        &self.layer
    }

    pub fn surface(&self) -> &PreviewSurface {
        &self.surface
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn authorization(&self) -> AuthorizationState {
        self.authorization
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_frame_index(&self) -> Option<usize> {
        self.last_frame_index
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_observation::FaceObservation;
    use crate::shared::geometry::NormalizedRect;
    use approx::assert_relative_eq;

    fn screen() -> OverlayScreen {
        OverlayScreen::new(
            ScreenRect::new(0.0, 0.0, 390.0, 844.0),
            PreviewGravity::ResizeAspectFill,
            StrokeStyle::default(),
            "FaceCam",
        )
    }

    fn faces(n: usize) -> OverlayEvent {
        OverlayEvent::FacesDetected {
            frame_index: n,
            faces: (0..n)
                .map(|i| {
                    FaceObservation::new(NormalizedRect::new(0.1 * i as f64, 0.1, 0.1, 0.1), 0.9)
                })
                .collect(),
        }
    }

    #[test]
    fn test_shape_count_tracks_latest_result() {
        let mut screen = screen();
        for n in [2, 5, 1, 3] {
            screen.handle(faces(n));
            assert_eq!(screen.shapes().len(), n);
            assert_eq!(screen.last_frame_index(), Some(n));
        }
    }

    #[test]
    fn test_zero_faces_removes_all_previous_shapes() {
        let mut screen = screen();
        screen.handle(faces(3));

        let change = screen.handle(faces(0)).unwrap();
        assert_eq!(change, LayerChange { removed: 3, added: 0 });
        assert!(screen.shapes().is_empty());
    }

    #[test]
    fn test_session_started_configures_surface() {
        let mut screen = screen();
        screen.handle(OverlayEvent::SessionStarted {
            width: 1920,
            height: 1080,
            rotation_degrees: 90,
        });
        assert!(screen.is_running());
        assert_eq!(screen.authorization(), AuthorizationState::Granted);
        assert_eq!(screen.surface().rotation(), 90);
        let displayed = screen.surface().displayed_video_size().unwrap();
        assert_relative_eq!(displayed.width, 1080.0);
    }

    #[test]
    fn test_shapes_use_current_style_and_bounds() {
        let mut screen = screen();
        screen.resize(ScreenRect::new(0.0, 0.0, 100.0, 100.0));
        screen.handle(OverlayEvent::FacesDetected {
            frame_index: 0,
            faces: vec![FaceObservation::new(NormalizedRect::FULL, 0.8)],
        });
        let shape = &screen.shapes()[0];
        assert_eq!(shape.rect, ScreenRect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(shape.style, StrokeStyle::default());
    }

    #[test]
    fn test_denial_is_recorded_without_running() {
        let mut screen = screen();
        screen.handle(OverlayEvent::Authorization(AuthorizationState::Denied));
        assert_eq!(screen.authorization(), AuthorizationState::Denied);
        assert!(!screen.is_running());
    }

    #[test]
    fn test_diagnostics_are_bounded() {
        let mut screen = screen();
        for i in 0..MAX_DIAGNOSTICS + 5 {
            screen.handle(OverlayEvent::Diagnostic(format!("problem {i}")));
        }
        assert_eq!(screen.diagnostics().len(), MAX_DIAGNOSTICS);
        assert_eq!(screen.diagnostics()[0], "problem 5");
    }

    #[test]
    fn test_layer_generation_changes_only_with_highlights() {
        let mut screen = screen();
        let start = screen.layer().generation();

        screen.handle(OverlayEvent::Diagnostic("slow frame".to_string()));
        screen.resize(ScreenRect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(screen.layer().generation(), start);

        screen.handle(faces(1));
        assert_eq!(screen.layer().generation(), start + 1);
        screen.session_stopped();
        assert_eq!(screen.layer().generation(), start + 2);
    }

    #[test]
    fn test_session_stopped_clears_shapes() {
        let mut screen = screen();
        screen.handle(faces(2));
        screen.session_stopped();
        assert!(screen.shapes().is_empty());
        assert!(!screen.is_running());
        assert_eq!(screen.caption(), "FaceCam");
    }
}
