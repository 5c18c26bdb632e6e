//! Mapping between surface (device pixel) and document coordinates.

use kurbo::Point;

/// Contain-fit transform from document space into the device surface.
///
/// The document is inscribed in the surface and letterboxed on the axis
/// that does not fill; offsets center it on the under-filled axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { scale: 1.0, dx: 0.0, dy: 0.0 }
    }
}

impl ViewTransform {
    /// Recompute the fit for a surface and document size, both in pixels.
    pub fn recompute(&mut self, surface_w: f64, surface_h: f64, doc_w: f64, doc_h: f64) {
        if surface_w <= 0.0 || surface_h <= 0.0 || doc_w <= 0.0 || doc_h <= 0.0 {
            *self = Self::default();
            return;
        }
        self.scale = (surface_w / doc_w).min(surface_h / doc_h);
        self.dx = (surface_w - doc_w * self.scale) / 2.0;
        self.dy = (surface_h - doc_h * self.scale) / 2.0;
    }

    /// Surface point to document point.
    pub fn to_document(&self, p: Point) -> Point {
        Point::new((p.x - self.dx) / self.scale, (p.y - self.dy) / self.scale)
    }

    /// Document point to surface point.
    pub fn to_view(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.dx, p.y * self.scale + self.dy)
    }

    /// Convert a tolerance given in device pixels into document units.
    pub fn doc_tolerance(&self, view_px: f64) -> f64 {
        view_px / self.scale.max(f64::EPSILON)
    }
}
