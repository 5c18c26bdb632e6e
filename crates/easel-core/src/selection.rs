//! Selection handles and drag gestures.

use crate::shapes::{Shape, ShapeId, ShapeKind};
use kurbo::{Point, Rect, Vec2};

/// Handle square size in device pixels (draw size and hit size).
pub const HANDLE_SIZE: f64 = 8.0;

/// The eight compass resize handles around a selection bbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Nw,
    N,
    Ne,
    W,
    E,
    Sw,
    S,
    Se,
}

impl HandleKind {
    pub const ALL: [HandleKind; 8] = [
        HandleKind::Nw,
        HandleKind::N,
        HandleKind::Ne,
        HandleKind::W,
        HandleKind::E,
        HandleKind::Sw,
        HandleKind::S,
        HandleKind::Se,
    ];

    /// Handle center on a bounding box, in the box's coordinate space.
    pub fn position(&self, bounds: Rect) -> Point {
        let cx = (bounds.x0 + bounds.x1) / 2.0;
        let cy = (bounds.y0 + bounds.y1) / 2.0;
        match self {
            HandleKind::Nw => Point::new(bounds.x0, bounds.y0),
            HandleKind::N => Point::new(cx, bounds.y0),
            HandleKind::Ne => Point::new(bounds.x1, bounds.y0),
            HandleKind::W => Point::new(bounds.x0, cy),
            HandleKind::E => Point::new(bounds.x1, cy),
            HandleKind::Sw => Point::new(bounds.x0, bounds.y1),
            HandleKind::S => Point::new(cx, bounds.y1),
            HandleKind::Se => Point::new(bounds.x1, bounds.y1),
        }
    }

    pub fn moves_left(&self) -> bool {
        matches!(self, HandleKind::Nw | HandleKind::W | HandleKind::Sw)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, HandleKind::Ne | HandleKind::E | HandleKind::Se)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, HandleKind::Nw | HandleKind::N | HandleKind::Ne)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, HandleKind::Sw | HandleKind::S | HandleKind::Se)
    }

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            HandleKind::Nw | HandleKind::Ne | HandleKind::Sw | HandleKind::Se
        )
    }
}

/// Find the handle under a document-space point, if any.
/// The hit area is a square of `HANDLE_SIZE` device pixels per side.
pub fn handle_at(bounds: Rect, p: Point, view_scale: f64) -> Option<HandleKind> {
    let half = HANDLE_SIZE / view_scale.max(f64::EPSILON) / 2.0;
    HandleKind::ALL.into_iter().find(|h| {
        let c = h.position(bounds);
        (p.x - c.x).abs() <= half && (p.y - c.y).abs() <= half
    })
}

/// An in-flight drag on the selection.
#[derive(Debug, Clone)]
pub enum DragState {
    /// Translate by a fixed pointer-to-origin offset captured at grab.
    Move { id: ShapeId, offset: Vec2 },
    /// Resize from a handle; `original` is the geometry at grab time.
    Resize {
        id: ShapeId,
        handle: HandleKind,
        original: Shape,
    },
}

/// Recompute a shape's geometry for a resize drag.
///
/// The grabbed edges track the pointer while the opposite edges stay where
/// they were. Shift on a corner handle forces a square bbox for non-line
/// shapes, anchored at the fixed corner. Lines keep their direction signs.
pub fn apply_resize(shape: &mut Shape, original: &Shape, handle: HandleKind, p: Point, shift: bool) {
    let ob = original.bounds();
    let mut x0 = ob.x0;
    let mut y0 = ob.y0;
    let mut x1 = ob.x1;
    let mut y1 = ob.y1;
    if handle.moves_left() {
        x0 = p.x;
    }
    if handle.moves_right() {
        x1 = p.x;
    }
    if handle.moves_top() {
        y0 = p.y;
    }
    if handle.moves_bottom() {
        y1 = p.y;
    }

    if shift && !matches!(shape.kind, ShapeKind::Line) {
        if handle.is_corner() {
            let ax = if handle.moves_left() { x1 } else { x0 };
            let ay = if handle.moves_top() { y1 } else { y0 };
            let px = if handle.moves_left() { x0 } else { x1 };
            let py = if handle.moves_top() { y0 } else { y1 };
            let size = (px - ax).abs().max((py - ay).abs());
            let qx = ax + size * (px - ax).signum();
            let qy = ay + size * (py - ay).signum();
            shape.set_bbox(Point::new(ax, ay), Point::new(qx, qy));
        } else if handle.moves_left() || handle.moves_right() {
            // Edge drag: the dragged axis grows to at least the other axis.
            let ax = if handle.moves_left() { x1 } else { x0 };
            let px = if handle.moves_left() { x0 } else { x1 };
            let size = (px - ax).abs().max(y1 - y0);
            let qx = ax + size * if px < ax { -1.0 } else { 1.0 };
            shape.set_bbox(Point::new(ax, y0), Point::new(qx, y1));
        } else {
            let ay = if handle.moves_top() { y1 } else { y0 };
            let py = if handle.moves_top() { y0 } else { y1 };
            let size = (py - ay).abs().max(x1 - x0);
            let qy = ay + size * if py < ay { -1.0 } else { 1.0 };
            shape.set_bbox(Point::new(x0, ay), Point::new(x1, qy));
        }
        return;
    }

    match shape.kind {
        ShapeKind::Line => {
            // Crossing over an edge flips the bbox; renormalize first.
            let (nx0, nx1) = (x0.min(x1), x0.max(x1));
            let (ny0, ny1) = (y0.min(y1), y0.max(y1));
            let sx = if original.width < 0.0 { -1.0 } else { 1.0 };
            let sy = if original.height < 0.0 { -1.0 } else { 1.0 };
            shape.width = (nx1 - nx0) * sx;
            shape.height = (ny1 - ny0) * sy;
            shape.origin = Point::new(
                if sx >= 0.0 { nx0 } else { nx1 },
                if sy >= 0.0 { ny0 } else { ny1 },
            );
        }
        _ => shape.set_bbox(Point::new(x0, y0), Point::new(x1, y1)),
    }
}
