use std::path::Path;

use image::{Rgba, RgbaImage};

use facecam_core::overlay::highlight_shape::HighlightShape;
use facecam_core::overlay::overlay_screen::OverlayScreen;
use facecam_core::shared::frame::Frame;
use facecam_core::shared::geometry::ScreenRect;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Renders what the live view would show: the frame placed by the preview
/// gravity, clipped to the screen, with every highlight outlined on top.
pub fn render(screen: &OverlayScreen, frame: Option<&Frame>) -> RgbaImage {
    let bounds = screen.surface().bounds();
    let width = bounds.width.round().max(1.0) as u32;
    let height = bounds.height.round().max(1.0) as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

    if let Some(frame) = frame {
        draw_frame(&mut canvas, frame, screen.surface().content_rect(), bounds);
    }
    for shape in screen.shapes() {
        stroke_rect(&mut canvas, shape, bounds);
    }
    canvas
}

pub fn write_snapshot(
    path: &Path,
    screen: &OverlayScreen,
    frame: Option<&Frame>,
) -> Result<(), image::ImageError> {
    render(screen, frame).save(path)
}

/// Nearest-neighbour sampling of `frame` stretched over `content`.
fn draw_frame(canvas: &mut RgbaImage, frame: &Frame, content: ScreenRect, bounds: ScreenRect) {
    if frame.width() == 0 || frame.height() == 0 || content.width <= 0.0 || content.height <= 0.0 {
        return;
    }
    let (fw, fh) = (frame.width() as f64, frame.height() as f64);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let sx = bounds.x + x as f64 + 0.5;
        let sy = bounds.y + y as f64 + 0.5;
        let u = (sx - content.x) / content.width * fw;
        let v = (sy - content.y) / content.height * fh;
        if u < 0.0 || v < 0.0 || u >= fw || v >= fh {
            continue;
        }
        let (r, g, b) = frame.rgb_at(u as u32, v as u32);
        *pixel = Rgba([r, g, b, 255]);
    }
}

/// Outlines the rectangle with the stroke centred on its edges.
fn stroke_rect(canvas: &mut RgbaImage, shape: &HighlightShape, bounds: ScreenRect) {
    if !shape.has_visible_stroke() {
        return;
    }
    let color = Rgba([
        shape.style.stroke.r,
        shape.style.stroke.g,
        shape.style.stroke.b,
        255,
    ]);
    let half = shape.style.line_width.max(1.0) / 2.0;
    let rect = shape.rect;
    let (left, top) = (rect.x - bounds.x, rect.y - bounds.y);
    let (right, bottom) = (left + rect.width, top + rect.height);

    fill(canvas, left - half, top - half, right + half, top + half, color);
    fill(canvas, left - half, bottom - half, right + half, bottom + half, color);
    fill(canvas, left - half, top - half, left + half, bottom + half, color);
    fill(canvas, right - half, top - half, right + half, bottom + half, color);
}

/// Paints every pixel whose centre lies in `[x0, x1) x [y0, y1)`.
fn fill(canvas: &mut RgbaImage, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>) {
    let clamp_x = |v: f64| v.round().clamp(0.0, canvas.width() as f64) as u32;
    let clamp_y = |v: f64| v.round().clamp(0.0, canvas.height() as f64) as u32;
    let (xa, xb, ya, yb) = (clamp_x(x0), clamp_x(x1), clamp_y(y0), clamp_y(y1));
    for y in ya..yb {
        for x in xa..xb {
            canvas.put_pixel(x, y, color);
        }
    }
}
