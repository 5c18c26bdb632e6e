//! The hybrid document: one raster buffer plus an ordered vector shape list.

use crate::shapes::{Shape, ShapeId};
use easel_raster::{brush_segment, Composite, Pixmap, Rgba};
use kurbo::Point;

/// A drawing document. Shape order is paint order (last on top).
#[derive(Debug, Clone)]
pub struct Document {
    raster: Pixmap,
    shapes: Vec<Shape>,
    selection: Option<ShapeId>,
}

impl Document {
    /// Create a white-backed document of the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: Pixmap::filled(width, height, Rgba::white()),
            shapes: Vec::new(),
            selection: None,
        }
    }

    pub fn raster(&self) -> &Pixmap {
        &self.raster
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn selection(&self) -> Option<ShapeId> {
        self.selection
    }

    /// True when a document-space point lies inside the raster bounds.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width() as f64 && p.y <= self.height() as f64
    }

    /// Wholesale content swap (import, undo). Clears the selection.
    pub fn replace(&mut self, raster: Pixmap, shapes: Vec<Shape>) {
        self.raster = raster;
        self.shapes = shapes;
        self.selection = None;
    }

    /// Swap the raster only, keeping shapes and selection (aspect change).
    pub fn set_raster(&mut self, raster: Pixmap) {
        self.raster = raster;
    }

    /// Append a shape on top of the paint order and return its id.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.shapes.push(shape);
        id
    }

    pub fn remove_shapes(&mut self, ids: &[ShapeId]) {
        self.shapes.retain(|s| !ids.contains(&s.id()));
        if let Some(sel) = self.selection {
            if ids.contains(&sel) {
                self.selection = None;
            }
        }
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    /// Select a live shape, or clear with `None`. Stale ids clear.
    pub fn set_selection(&mut self, id: Option<ShapeId>) {
        self.selection = id.filter(|id| self.shapes.iter().any(|s| s.id() == *id));
    }

    pub fn selected(&self) -> Option<&Shape> {
        self.selection.and_then(|id| self.shape(id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Shape> {
        self.selection.and_then(|id| self.shapes.iter_mut().find(|s| s.id() == id))
    }

    /// Topmost shape under a document-space point, if any.
    pub fn shape_at(&self, p: Point, view_scale: f64) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(p, view_scale))
            .map(|s| s.id())
    }

    /// Paint one brush or eraser segment into the raster.
    pub fn paint_segment(&mut self, a: Point, b: Point, width: f64, color: Rgba, erase: bool) {
        let composite = if erase { Composite::DestinationOut } else { Composite::SourceOver };
        let color = if erase { Rgba::new(0, 0, 0, 255) } else { color };
        brush_segment(&mut self.raster, a, b, width, color, composite);
    }

    /// Reset to a blank white raster; drops all shapes and the selection.
    pub fn clear_to_white(&mut self) {
        self.raster.fill(Rgba::white());
        self.shapes.clear();
        self.selection = None;
    }
}
