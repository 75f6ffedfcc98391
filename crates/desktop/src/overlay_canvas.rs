use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use facecam_core::overlay::highlight_shape::{HighlightShape, LineJoin, Rgb};

/// Draws the highlight outlines above the live preview. The canvas covers
/// the same area as the preview, so shape coordinates are used as-is.
///
/// Geometry is kept in `cache` until the app clears it for a new layer
/// generation.
pub struct OverlayCanvas<'a> {
    shapes: &'a [HighlightShape],
    cache: &'a canvas::Cache,
}

impl<'a> OverlayCanvas<'a> {
    pub fn new(shapes: &'a [HighlightShape], cache: &'a canvas::Cache) -> Self {
        Self { shapes, cache }
    }
}

impl<Message> canvas::Program<Message> for OverlayCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self.cache.draw(renderer, bounds.size(), |frame| {
            for shape in self.shapes {
                draw_shape(frame, shape);
            }
        });
        vec![geometry]
    }
}

fn draw_shape(frame: &mut Frame, shape: &HighlightShape) {
    let rect = shape.rect;
    let path = Path::rectangle(
        Point::new(rect.x as f32, rect.y as f32),
        Size::new(rect.width as f32, rect.height as f32),
    );
    if let Some(fill) = shape.style.fill {
        frame.fill(&path, to_color(fill));
    }
    if shape.has_visible_stroke() {
        frame.stroke(
            &path,
            Stroke {
                style: canvas::Style::Solid(to_color(shape.style.stroke)),
                width: shape.style.line_width as f32,
                line_join: to_canvas_join(shape.style.line_join),
                ..Stroke::default()
            },
        );
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}

fn to_canvas_join(join: LineJoin) -> canvas::LineJoin {
    match join {
        LineJoin::Miter => canvas::LineJoin::Miter,
        LineJoin::Round => canvas::LineJoin::Round,
        LineJoin::Bevel => canvas::LineJoin::Bevel,
    }
}
