//! Compositing the document onto the device surface, plus redraw coalescing.

use crate::document::Document;
use crate::selection::{HandleKind, HANDLE_SIZE};
use crate::shapes::{Shape, ShapeKind};
use crate::view::ViewTransform;
use easel_raster::{blit_scaled, fill_ellipse, fill_polygon, stroke_polyline, Pixmap, Rgba};
use kurbo::{Point, Vec2};

const SELECTION_COLOR: Rgba = Rgba { r: 11, g: 132, b: 255, a: 255 };
const DASH_LEN: f64 = 4.0;

/// Coalesces redraw requests: at most one is pending at a time.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: bool,
}

impl RedrawScheduler {
    /// Request a redraw. A no-op while one is already pending.
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Paint one shape into a pixmap under a uniform scale + offset transform.
/// Closed kinds fill first, then stroke; lines stroke only.
pub fn paint_shape(target: &mut Pixmap, shape: &Shape, scale: f64, offset: Vec2) {
    let map = |p: Point| Point::new(p.x * scale + offset.x, p.y * scale + offset.y);
    let stroke_width = shape.style.stroke_width * scale;

    if let ShapeKind::Line = shape.kind {
        if let Some(stroke) = shape.style.stroke {
            let (a, b) = shape.line_endpoints();
            stroke_polyline(target, &[map(a), map(b)], stroke_width, stroke, false);
        }
        return;
    }

    let outline: Vec<Point> = shape.outline().into_iter().map(map).collect();
    if let Some(fill) = shape.style.fill {
        match shape.kind {
            // Exact row extents beat the segment approximation for fills.
            ShapeKind::Ellipse => {
                let bounds = shape.bounds();
                fill_ellipse(
                    target,
                    map(bounds.center()),
                    bounds.width() / 2.0 * scale,
                    bounds.height() / 2.0 * scale,
                    fill,
                );
            }
            _ => fill_polygon(target, &outline, fill),
        }
    }
    if let Some(stroke) = shape.style.stroke {
        stroke_polyline(target, &outline, stroke_width, stroke, true);
    }
}

/// Flatten a document into a standalone pixmap at its natural size.
pub fn flatten(doc: &Document) -> Pixmap {
    let mut out = doc.raster().clone();
    for shape in doc.shapes() {
        paint_shape(&mut out, shape, 1.0, Vec2::ZERO);
    }
    out
}

/// Render one frame: white clear, scaled raster, shapes in paint order,
/// selection overlay, then the in-progress creation draft on top.
pub fn present(surface: &mut Pixmap, doc: &Document, view: &ViewTransform, draft: Option<&Shape>) {
    surface.fill(Rgba::white());
    blit_scaled(surface, doc.raster(), Point::new(view.dx, view.dy), view.scale);

    let offset = Vec2::new(view.dx, view.dy);
    for shape in doc.shapes() {
        paint_shape(surface, shape, view.scale, offset);
    }

    if let Some(selected) = doc.selected() {
        draw_selection_overlay(surface, selected, view);
    }

    if let Some(draft) = draft {
        paint_shape(surface, draft, view.scale, offset);
    }
}

/// Dashed bbox outline plus the eight resize handle squares.
/// Dash and handle sizes are fixed in device pixels, independent of zoom.
fn draw_selection_overlay(surface: &mut Pixmap, shape: &Shape, view: &ViewTransform) {
    let bounds = shape.bounds();
    let corners = [
        view.to_view(Point::new(bounds.x0, bounds.y0)),
        view.to_view(Point::new(bounds.x1, bounds.y0)),
        view.to_view(Point::new(bounds.x1, bounds.y1)),
        view.to_view(Point::new(bounds.x0, bounds.y1)),
    ];
    for i in 0..4 {
        dashed_segment(surface, corners[i], corners[(i + 1) % 4]);
    }

    let half = HANDLE_SIZE / 2.0;
    for handle in HandleKind::ALL {
        let c = view.to_view(handle.position(bounds));
        let square = [
            Point::new(c.x - half, c.y - half),
            Point::new(c.x + half, c.y - half),
            Point::new(c.x + half, c.y + half),
            Point::new(c.x - half, c.y + half),
        ];
        fill_polygon(surface, &square, Rgba::white());
        stroke_polyline(surface, &square, 1.0, SELECTION_COLOR, true);
    }
}

fn dashed_segment(surface: &mut Pixmap, a: Point, b: Point) {
    let dist = a.distance(b);
    if dist < f64::EPSILON {
        return;
    }
    let dir = Vec2::new((b.x - a.x) / dist, (b.y - a.y) / dist);
    let mut t = 0.0;
    while t < dist {
        let end = (t + DASH_LEN).min(dist);
        let p0 = Point::new(a.x + dir.x * t, a.y + dir.y * t);
        let p1 = Point::new(a.x + dir.x * end, a.y + dir.y * end);
        stroke_polyline(surface, &[p0, p1], 1.0, SELECTION_COLOR, false);
        t += DASH_LEN * 2.0;
    }
}
