//! Vector shape primitives for the drawing engine.

use easel_raster::Rgba;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Polygon/star side-count limits.
pub const MIN_SIDES: u32 = 3;
pub const MAX_SIDES: u32 = 64;
/// Side count given to freshly created polygons and stars.
pub const DEFAULT_SIDES: u32 = 5;
/// Inner-to-outer radius ratio for new stars.
pub const DEFAULT_INNER_RATIO: f64 = 0.5;

/// Segment count used to approximate an ellipse outline for stroking.
const ELLIPSE_SEGMENTS: usize = 64;

/// The parametric kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rect,
    Ellipse,
    /// Directed segment; `width`/`height` are the delta from `origin`.
    Line,
    Polygon {
        sides: u32,
    },
    Star {
        sides: u32,
        inner_ratio: f64,
    },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Polygon { .. } => "polygon",
            ShapeKind::Star { .. } => "star",
        }
    }

    /// Closed shapes get fill-then-stroke; lines get stroke only.
    pub fn is_closed(&self) -> bool {
        !matches!(self, ShapeKind::Line)
    }

    pub fn sides(&self) -> Option<u32> {
        match self {
            ShapeKind::Polygon { sides } | ShapeKind::Star { sides, .. } => Some(*sides),
            _ => None,
        }
    }

    pub fn inner_ratio(&self) -> Option<f64> {
        match self {
            ShapeKind::Star { inner_ratio, .. } => Some(*inner_ratio),
            _ => None,
        }
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color (None = no stroke).
    pub stroke: Option<Rgba>,
    /// Fill color (None = no fill).
    pub fill: Option<Rgba>,
    /// Stroke width in document units.
    pub stroke_width: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke: Some(Rgba::black()),
            fill: None,
            stroke_width: 1.0,
        }
    }
}

/// A vector shape stored by geometry + style, not by pixels.
///
/// For every kind except `Line` the committed geometry is a normalized
/// bounding box (`width, height >= 0`). Lines keep a directed delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    pub kind: ShapeKind,
    /// Top-left of the bbox; for lines, the start point.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl Shape {
    /// Create a zero-sized shape anchored at a point.
    pub fn new(kind: ShapeKind, origin: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            origin,
            width: 0.0,
            height: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Normalized bounding box (handles negative line deltas).
    pub fn bounds(&self) -> Rect {
        let x1 = self.origin.x + self.width;
        let y1 = self.origin.y + self.height;
        Rect::new(
            self.origin.x.min(x1),
            self.origin.y.min(y1),
            self.origin.x.max(x1),
            self.origin.y.max(y1),
        )
    }

    /// Replace geometry with a normalized bbox computed from two corners.
    pub fn set_bbox(&mut self, a: Point, b: Point) {
        self.origin = Point::new(a.x.min(b.x), a.y.min(b.y));
        self.width = (a.x - b.x).abs();
        self.height = (a.y - b.y).abs();
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Start and end point of a line (start = origin, end = origin + delta).
    pub fn line_endpoints(&self) -> (Point, Point) {
        (
            self.origin,
            Point::new(self.origin.x + self.width, self.origin.y + self.height),
        )
    }

    /// Segment length (meaningful for lines).
    pub fn line_length(&self) -> f64 {
        Vec2::new(self.width, self.height).hypot()
    }

    /// Closed outline polyline in document space.
    /// Lines are handled separately via `line_endpoints`.
    pub fn outline(&self) -> Vec<Point> {
        let bounds = self.bounds();
        let center = bounds.center();
        let rx = bounds.width() / 2.0;
        let ry = bounds.height() / 2.0;
        let rot = -std::f64::consts::FRAC_PI_2;

        match self.kind {
            ShapeKind::Rect => vec![
                Point::new(bounds.x0, bounds.y0),
                Point::new(bounds.x1, bounds.y0),
                Point::new(bounds.x1, bounds.y1),
                Point::new(bounds.x0, bounds.y1),
            ],
            ShapeKind::Ellipse => (0..ELLIPSE_SEGMENTS)
                .map(|i| {
                    let a = i as f64 * std::f64::consts::TAU / ELLIPSE_SEGMENTS as f64;
                    Point::new(center.x + a.cos() * rx, center.y + a.sin() * ry)
                })
                .collect(),
            ShapeKind::Polygon { sides } => {
                let n = sides.max(MIN_SIDES);
                (0..n)
                    .map(|i| {
                        let a = rot + i as f64 * std::f64::consts::TAU / n as f64;
                        Point::new(center.x + a.cos() * rx, center.y + a.sin() * ry)
                    })
                    .collect()
            }
            ShapeKind::Star { sides, inner_ratio } => {
                let n = sides.max(MIN_SIDES);
                let rix = rx * inner_ratio;
                let riy = ry * inner_ratio;
                let mut pts = Vec::with_capacity(2 * n as usize);
                for i in 0..n {
                    let outer = rot + i as f64 * std::f64::consts::TAU / n as f64;
                    let inner = outer + std::f64::consts::PI / n as f64;
                    pts.push(Point::new(center.x + outer.cos() * rx, center.y + outer.sin() * ry));
                    pts.push(Point::new(center.x + inner.cos() * rix, center.y + inner.sin() * riy));
                }
                pts
            }
            ShapeKind::Line => {
                let (a, b) = self.line_endpoints();
                vec![a, b]
            }
        }
    }

    /// Check if a point (in document coordinates) hits this shape.
    ///
    /// Closed kinds use bbox containment; outline-accurate picking is not
    /// required for pointer selection. Lines use the distance to the segment
    /// with a tolerance of `max(4, stroke_width)` view pixels.
    pub fn hit_test(&self, point: Point, view_scale: f64) -> bool {
        match self.kind {
            ShapeKind::Line => {
                let tol = self.style.stroke_width.max(4.0) / view_scale.max(f64::EPSILON);
                let (a, b) = self.line_endpoints();
                point_to_segment_dist(point, a, b) <= tol
            }
            _ => self.bounds().contains(point),
        }
    }
}

/// Distance from a point to a line segment (a->b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Serialize a shape list to JSON (draft persistence boundary).
pub fn shapes_to_json(shapes: &[Shape]) -> Result<String, serde_json::Error> {
    serde_json::to_string(shapes)
}

/// Deserialize a shape list from JSON.
pub fn shapes_from_json(json: &str) -> Result<Vec<Shape>, serde_json::Error> {
    serde_json::from_str(json)
}
