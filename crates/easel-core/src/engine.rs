//! The engine facade: owns the document, history, view, gesture state and
//! the device surface. All mutation happens synchronously inside an event
//! call; every bit of gesture state lives on the instance.

use crate::document::Document;
use crate::history::{History, HistoryEntry};
use crate::input::{Modifiers, PointerInput, Tool, ToolConfig};
use crate::render::{self, RedrawScheduler};
use crate::selection::{apply_resize, handle_at, DragState};
use crate::shapes::{Shape, ShapeId, ShapeKind, MAX_SIDES, MIN_SIDES};
use crate::view::ViewTransform;
use easel_raster::{blit_scaled, decode_data_url, export_data_url, CodecError, ImageFormat, Pixmap, Rgba};
use kurbo::{Point, Vec2};
use thiserror::Error;

const RATIO_EPSILON: f64 = 1e-6;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no document mounted")]
    NoDocument,
    #[error("no shape selected")]
    NoSelection,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Direction hint for converting a rectangle into a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedHint {
    Up,
    Down,
}

/// Read-only description of the current selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionInfo {
    pub id: ShapeId,
    pub kind: &'static str,
    pub sides: Option<u32>,
    pub inner_ratio: Option<f64>,
}

/// A shape being drawn out; not in the document until commit.
#[derive(Debug, Clone)]
struct CreationDraft {
    anchor: Point,
    from_center: bool,
    shape: Shape,
}

/// The pointer gesture state machine. A gesture is bound to the pointer
/// that started it; events from other pointers are ignored until it ends.
#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Painting {
        pointer_id: u64,
        last: Point,
        width: f64,
        color: Rgba,
        erase: bool,
    },
    Creating {
        pointer_id: u64,
        draft: CreationDraft,
    },
    Dragging {
        pointer_id: u64,
        drag: DragState,
    },
}

impl Gesture {
    fn pointer_id(&self) -> Option<u64> {
        match self {
            Gesture::Idle => None,
            Gesture::Painting { pointer_id, .. }
            | Gesture::Creating { pointer_id, .. }
            | Gesture::Dragging { pointer_id, .. } => Some(*pointer_id),
        }
    }
}

/// The drawing engine. One instance per canvas.
pub struct Engine {
    doc: Option<Document>,
    history: History,
    view: ViewTransform,
    gesture: Gesture,
    scheduler: RedrawScheduler,
    surface: Pixmap,
    config: ToolConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            doc: None,
            history: History::new(),
            view: ViewTransform::default(),
            gesture: Gesture::Idle,
            scheduler: RedrawScheduler::default(),
            surface: Pixmap::new(1, 1),
            config: ToolConfig::default(),
        }
    }

    /// Attach to a viewport. The document is created lazily on first mount,
    /// sized to the device surface (viewport times device pixel ratio).
    pub fn mount(&mut self, viewport_w: u32, viewport_h: u32, dpr: f64) {
        self.apply_surface(viewport_w, viewport_h, dpr);
        if self.doc.is_none() {
            self.doc = Some(Document::new(self.surface.width(), self.surface.height()));
        }
        self.refresh_view();
        self.scheduler.request();
    }

    /// Viewport size change; the document is untouched.
    pub fn resize(&mut self, viewport_w: u32, viewport_h: u32, dpr: f64) {
        self.apply_surface(viewport_w, viewport_h, dpr);
        self.refresh_view();
        self.scheduler.request();
    }

    /// Detach from the viewport. Document and history survive for remount.
    pub fn unmount(&mut self) {
        self.gesture = Gesture::Idle;
        self.scheduler.take();
    }

    fn apply_surface(&mut self, viewport_w: u32, viewport_h: u32, dpr: f64) {
        let w = (viewport_w as f64 * dpr).round().max(1.0) as u32;
        let h = (viewport_h as f64 * dpr).round().max(1.0) as u32;
        self.surface = Pixmap::new(w, h);
    }

    fn refresh_view(&mut self) {
        if let Some(doc) = &self.doc {
            self.view.recompute(
                self.surface.width() as f64,
                self.surface.height() as f64,
                doc.width() as f64,
                doc.height() as f64,
            );
        }
    }

    fn push_history(&mut self) {
        match &self.doc {
            Some(doc) => self.history.push(HistoryEntry::capture(doc)),
            None => log::warn!("history snapshot skipped: no document mounted"),
        }
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        if !matches!(self.gesture, Gesture::Idle) {
            return;
        }
        let p = self.view.to_document(input.position);
        match &self.doc {
            Some(doc) if doc.contains(p) => {}
            _ => return,
        }
        // Pre-image snapshot for whatever this gesture ends up doing.
        self.push_history();
        let scale = self.view.scale;
        match self.config.tool {
            Tool::Select => {
                let Some(doc) = self.doc.as_mut() else {
                    return;
                };
                if let Some(selected) = doc.selected() {
                    if let Some(handle) = handle_at(selected.bounds(), p, scale) {
                        self.gesture = Gesture::Dragging {
                            pointer_id: input.pointer_id,
                            drag: DragState::Resize {
                                id: selected.id(),
                                handle,
                                original: selected.clone(),
                            },
                        };
                        self.scheduler.request();
                        return;
                    }
                }
                match doc.shape_at(p, scale) {
                    Some(id) => {
                        doc.set_selection(Some(id));
                        if let Some(shape) = doc.shape(id) {
                            let offset = Vec2::new(shape.origin.x - p.x, shape.origin.y - p.y);
                            self.gesture = Gesture::Dragging {
                                pointer_id: input.pointer_id,
                                drag: DragState::Move { id, offset },
                            };
                        }
                    }
                    None => doc.set_selection(None),
                }
            }
            Tool::Brush | Tool::Eraser => {
                let erase = self.config.tool == Tool::Eraser;
                let width = (self.config.brush_size / scale).max(0.5);
                let color = self.config.brush_color;
                if let Some(doc) = self.doc.as_mut() {
                    doc.paint_segment(p, p, width, color, erase);
                }
                self.gesture = Gesture::Painting {
                    pointer_id: input.pointer_id,
                    last: p,
                    width,
                    color,
                    erase,
                };
            }
            tool => {
                if let Some(kind) = tool.creates() {
                    let mut shape = Shape::new(kind, p);
                    shape.style = self.config.shape_style();
                    self.gesture = Gesture::Creating {
                        pointer_id: input.pointer_id,
                        draft: CreationDraft {
                            anchor: p,
                            from_center: input.modifiers.alt,
                            shape,
                        },
                    };
                }
            }
        }
        self.scheduler.request();
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        match self.gesture.pointer_id() {
            Some(id) if id == input.pointer_id => {}
            _ => return,
        }
        if input.buttons == 0 {
            // The release happened where we could not see it.
            self.pointer_up(input);
            return;
        }
        let p = self.view.to_document(input.position);
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Painting {
                last, width, color, erase, ..
            } => {
                let a = *last;
                *last = p;
                let (width, color, erase) = (*width, *color, *erase);
                if let Some(doc) = self.doc.as_mut() {
                    doc.paint_segment(a, p, width, color, erase);
                }
            }
            Gesture::Dragging { drag, .. } => {
                if let Some(doc) = self.doc.as_mut() {
                    match drag {
                        DragState::Move { id, offset } => {
                            if let Some(shape) = doc.shape_mut(*id) {
                                shape.origin = Point::new(p.x + offset.x, p.y + offset.y);
                            }
                        }
                        DragState::Resize { id, handle, original } => {
                            if let Some(shape) = doc.shape_mut(*id) {
                                apply_resize(shape, original, *handle, p, input.modifiers.shift);
                            }
                        }
                    }
                }
            }
            Gesture::Creating { draft, .. } => {
                // Track live style settings so the preview follows them.
                draft.shape.style = self.config.shape_style();
                update_draft(draft, p, input.modifiers);
            }
        }
        self.scheduler.request();
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        match self.gesture.pointer_id() {
            Some(id) if id == input.pointer_id => {}
            _ => return,
        }
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if let Gesture::Creating { draft, .. } = gesture {
            if !is_degenerate(&draft.shape) {
                if let Some(doc) = self.doc.as_mut() {
                    let id = doc.add_shape(draft.shape);
                    doc.set_selection(Some(id));
                }
            }
        }
        self.scheduler.request();
    }

    pub fn pointer_enter(&mut self, _input: PointerInput) {}

    /// The pointer left the surface: abort any in-progress gesture.
    pub fn pointer_leave(&mut self) {
        if !matches!(self.gesture, Gesture::Idle) {
            self.gesture = Gesture::Idle;
            self.scheduler.request();
        }
    }

    /// Pop the most recent snapshot and restore it. Returns false when the
    /// history is empty or nothing is mounted.
    pub fn undo(&mut self) -> bool {
        if self.doc.is_none() {
            return false;
        }
        let Some(entry) = self.history.pop() else {
            return false;
        };
        let mut raster = Pixmap::new(entry.width, entry.height);
        raster.data_mut().copy_from_slice(&entry.pixels);
        if let Some(doc) = self.doc.as_mut() {
            doc.replace(raster, entry.shapes);
        }
        self.gesture = Gesture::Idle;
        self.refresh_view();
        self.scheduler.request();
        true
    }

    /// Reset to a blank white document, undoable.
    pub fn clear(&mut self) {
        if self.doc.is_none() {
            return;
        }
        self.push_history();
        if let Some(doc) = self.doc.as_mut() {
            doc.clear_to_white();
        }
        self.scheduler.request();
    }

    /// Copy the tool configuration in. Changing style settings while the
    /// select tool holds a selection re-applies them to the selected shape,
    /// with a history push first.
    pub fn set_config(&mut self, config: ToolConfig) {
        if config.tool == Tool::Select {
            let style = config.shape_style();
            let changed = self
                .doc
                .as_ref()
                .and_then(|doc| doc.selected())
                .map(|shape| shape.style != style)
                .unwrap_or(false);
            if changed {
                self.push_history();
                if let Some(shape) = self.doc.as_mut().and_then(|doc| doc.selected_mut()) {
                    shape.style = style;
                }
                self.scheduler.request();
            }
        }
        self.config = config;
    }

    /// Flatten and encode as a data URL. Never fails: the codec falls back
    /// from the requested format to PNG and then to a raw payload.
    pub fn export_image(&self, format: Option<ImageFormat>, quality: Option<f64>) -> String {
        let flat = match &self.doc {
            Some(doc) => render::flatten(doc),
            None => Pixmap::filled(1, 1, Rgba::white()),
        };
        let url = export_data_url(&flat, format, quality);
        log::debug!("exported {}x{} document ({} chars)", flat.width(), flat.height(), url.len());
        url
    }

    /// Replace the document with a decoded image on a white backing at the
    /// image's natural size. Vector shapes and selection are dropped.
    pub fn import_image(&mut self, input: &str) -> Result<(), EngineError> {
        if self.doc.is_none() {
            return Err(EngineError::NoDocument);
        }
        self.push_history();
        let decoded = decode_data_url(input)?;
        let mut raster = Pixmap::filled(decoded.width(), decoded.height(), Rgba::white());
        blit_scaled(&mut raster, &decoded, Point::ZERO, 1.0);
        if let Some(doc) = self.doc.as_mut() {
            doc.replace(raster, Vec::new());
        }
        self.gesture = Gesture::Idle;
        self.refresh_view();
        self.scheduler.request();
        log::debug!("imported {}x{} image", decoded.width(), decoded.height());
        Ok(())
    }

    /// Re-letter the document to an `A:B` pixel ratio by growing one axis
    /// of the raster (white padding, old content centered). Returns false
    /// for malformed input; a ratio already matching only refits the view.
    /// Vector shapes keep their document coordinates.
    pub fn set_aspect_ratio(&mut self, ratio: &str) -> bool {
        let Some((num, den)) = parse_ratio(ratio) else {
            return false;
        };
        let Some(doc) = self.doc.as_ref() else {
            return false;
        };
        let target = num as f64 / den as f64;
        let (w, h) = (doc.width() as f64, doc.height() as f64);
        if (w / h - target).abs() < RATIO_EPSILON {
            self.refresh_view();
            self.scheduler.request();
            return true;
        }
        self.push_history();
        let (new_w, new_h) = if w / h < target {
            ((h * target).ceil() as u32, h as u32)
        } else {
            (w as u32, (w / target).ceil() as u32)
        };
        let mut raster = Pixmap::filled(new_w, new_h, Rgba::white());
        if let Some(doc) = self.doc.as_mut() {
            raster.copy_from_centered(doc.raster());
            doc.set_raster(raster);
        }
        self.refresh_view();
        self.scheduler.request();
        log::debug!("aspect ratio {ratio}: document is now {new_w}x{new_h}");
        true
    }

    /// Step the selected shape's side count, converting rectangles and
    /// ellipses into polygons on the first step.
    pub fn adjust_polygon_sides(&mut self, delta: i32, seed: SeedHint) -> Result<(), EngineError> {
        let Some(doc) = self.doc.as_ref() else {
            return Err(EngineError::NoDocument);
        };
        if doc.selected().is_none() {
            return Err(EngineError::NoSelection);
        }
        self.push_history();
        if let Some(shape) = self.doc.as_mut().and_then(|doc| doc.selected_mut()) {
            shape.kind = match shape.kind {
                ShapeKind::Polygon { sides } => ShapeKind::Polygon {
                    sides: clamp_sides(sides as i64 + delta as i64),
                },
                ShapeKind::Star { sides, inner_ratio } => ShapeKind::Star {
                    sides: clamp_sides(sides as i64 + delta as i64),
                    inner_ratio,
                },
                ShapeKind::Rect => ShapeKind::Polygon {
                    sides: match seed {
                        SeedHint::Up => 5,
                        SeedHint::Down => 3,
                    },
                },
                ShapeKind::Ellipse => ShapeKind::Polygon {
                    sides: if delta > 0 { 5 } else { 3 },
                },
                ShapeKind::Line => ShapeKind::Line,
            };
        }
        self.scheduler.request();
        Ok(())
    }

    pub fn selection_info(&self) -> Option<SelectionInfo> {
        let shape = self.doc.as_ref()?.selected()?;
        Some(SelectionInfo {
            id: shape.id(),
            kind: shape.kind.name(),
            sides: shape.kind.sides(),
            inner_ratio: shape.kind.inner_ratio(),
        })
    }

    /// Render a frame into the device surface and hand it out.
    /// Consumes any pending redraw request.
    pub fn present(&mut self) -> &Pixmap {
        self.scheduler.take();
        if let Some(doc) = &self.doc {
            let draft = match &self.gesture {
                Gesture::Creating { draft, .. } => Some(&draft.shape),
                _ => None,
            };
            render::present(&mut self.surface, doc, &self.view, draft);
        }
        &self.surface
    }

    pub fn needs_present(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn document(&self) -> Option<&Document> {
        self.doc.as_ref()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }
}

/// Recompute the draft geometry from the fixed anchor and the pointer.
fn update_draft(draft: &mut CreationDraft, p: Point, modifiers: Modifiers) {
    let a = draft.anchor;
    if let ShapeKind::Line = draft.shape.kind {
        let mut d = Vec2::new(p.x - a.x, p.y - a.y);
        if modifiers.shift {
            let len = d.hypot();
            if len > f64::EPSILON {
                let step = std::f64::consts::FRAC_PI_4;
                let angle = (d.y.atan2(d.x) / step).round() * step;
                d = Vec2::new(angle.cos() * len, angle.sin() * len);
            }
        }
        // Lines always start at the press point; the center flag only
        // applies to bbox shapes.
        draft.shape.origin = a;
        draft.shape.width = d.x;
        draft.shape.height = d.y;
        return;
    }
    let mut q = p;
    if modifiers.shift {
        let dx = q.x - a.x;
        let dy = q.y - a.y;
        let size = dx.abs().max(dy.abs());
        let sx = if dx < 0.0 { -1.0 } else if dx > 0.0 { 1.0 } else { 0.0 };
        let sy = if dy < 0.0 { -1.0 } else if dy > 0.0 { 1.0 } else { 0.0 };
        q = Point::new(a.x + size * sx, a.y + size * sy);
    }
    if draft.from_center {
        draft.shape.set_bbox(Point::new(2.0 * a.x - q.x, 2.0 * a.y - q.y), q);
    } else {
        draft.shape.set_bbox(a, q);
    }
}

/// Accidental clicks never commit: sub-pixel shapes are dropped silently.
fn is_degenerate(shape: &Shape) -> bool {
    match shape.kind {
        ShapeKind::Line => shape.line_length() < 1.0,
        _ => shape.width.abs() < 1.0 || shape.height.abs() < 1.0,
    }
}

fn clamp_sides(n: i64) -> u32 {
    n.clamp(MIN_SIDES as i64, MAX_SIDES as i64) as u32
}

/// Parse an `A:B` ratio of positive integers.
fn parse_ratio(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once(':')?;
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if !a.bytes().all(|c| c.is_ascii_digit()) || !b.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.mount(800, 600, 1.0);
        engine
    }

    fn set_tool(engine: &mut Engine, tool: Tool) {
        let mut config = engine.config().clone();
        config.tool = tool;
        engine.set_config(config);
    }

    fn event(x: f64, y: f64, buttons: u32) -> PointerInput {
        PointerInput::new(Point::new(x, y), 1, buttons)
    }

    fn press(engine: &mut Engine, x: f64, y: f64) {
        engine.pointer_down(event(x, y, 1));
    }

    fn drag(engine: &mut Engine, x: f64, y: f64) {
        engine.pointer_move(event(x, y, 1));
    }

    fn drag_mods(engine: &mut Engine, x: f64, y: f64, shift: bool, alt: bool) {
        engine.pointer_move(event(x, y, 1).with_modifiers(Modifiers { shift, alt }));
    }

    fn release(engine: &mut Engine, x: f64, y: f64) {
        engine.pointer_up(event(x, y, 0));
    }

    fn make_rect(engine: &mut Engine) -> ShapeId {
        set_tool(engine, Tool::Rect);
        press(engine, 100.0, 100.0);
        drag(engine, 300.0, 200.0);
        release(engine, 300.0, 200.0);
        engine.document().and_then(|d| d.selection()).unwrap()
    }

    #[test]
    fn test_rect_creation_gesture() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        let doc = engine.document().unwrap();
        assert_eq!(doc.shapes().len(), 1);
        let shape = doc.shape(id).unwrap();
        assert_eq!(shape.origin, Point::new(100.0, 100.0));
        assert!((shape.width - 200.0).abs() < f64::EPSILON);
        assert!((shape.height - 100.0).abs() < f64::EPSILON);
        assert_eq!(engine.selection_info().map(|i| i.kind), Some("rect"));
        // One snapshot from the pointer down
        assert_eq!(engine.history_len(), 1);
    }

    #[test]
    fn test_shift_drag_creates_square() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        press(&mut engine, 100.0, 100.0);
        drag_mods(&mut engine, 300.0, 200.0, true, false);
        release(&mut engine, 300.0, 200.0);
        let doc = engine.document().unwrap();
        let shape = doc.selected().unwrap();
        assert!((shape.width - 200.0).abs() < f64::EPSILON);
        assert!((shape.height - 200.0).abs() < f64::EPSILON);
        assert_eq!(shape.origin, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_alt_drag_creates_from_center() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Ellipse);
        engine.pointer_down(event(200.0, 200.0, 1).with_modifiers(Modifiers { shift: false, alt: true }));
        drag(&mut engine, 250.0, 230.0);
        release(&mut engine, 250.0, 230.0);
        let doc = engine.document().unwrap();
        let shape = doc.selected().unwrap();
        assert_eq!(shape.origin, Point::new(150.0, 170.0));
        assert!((shape.width - 100.0).abs() < f64::EPSILON);
        assert!((shape.height - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_draft_is_discarded() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 100.5, 100.4);
        release(&mut engine, 100.5, 100.4);
        let doc = engine.document().unwrap();
        assert!(doc.shapes().is_empty());
        assert_eq!(doc.selection(), None);
    }

    #[test]
    fn test_degenerate_line_is_discarded() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Line);
        press(&mut engine, 50.0, 50.0);
        drag(&mut engine, 50.5, 50.5);
        release(&mut engine, 50.5, 50.5);
        assert!(engine.document().unwrap().shapes().is_empty());
    }

    #[test]
    fn test_line_shift_snaps_to_45_degrees() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Line);
        press(&mut engine, 100.0, 100.0);
        drag_mods(&mut engine, 200.0, 110.0, true, false);
        release(&mut engine, 200.0, 110.0);
        let doc = engine.document().unwrap();
        let shape = doc.selected().unwrap();
        // Snapped to horizontal, length preserved
        assert!(shape.height.abs() < 1e-9);
        let len = (100.0f64 * 100.0 + 10.0 * 10.0).sqrt();
        assert!((shape.width - len).abs() < 1e-9);
    }

    #[test]
    fn test_alt_line_keeps_press_anchor() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Line);
        engine.pointer_down(event(100.0, 100.0, 1).with_modifiers(Modifiers { shift: false, alt: true }));
        drag(&mut engine, 150.0, 140.0);
        release(&mut engine, 150.0, 140.0);
        let doc = engine.document().unwrap();
        let shape = doc.selected().unwrap();
        // The center flag applies to bbox shapes only
        assert_eq!(shape.origin, Point::new(100.0, 100.0));
        assert!((shape.width - 50.0).abs() < f64::EPSILON);
        assert!((shape.height - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mid_gesture_style_change_updates_draft() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 150.0, 150.0);

        let mut config = engine.config().clone();
        config.fill = Some(Rgba::new(255, 0, 0, 255));
        engine.set_config(config);

        drag(&mut engine, 200.0, 200.0);
        release(&mut engine, 200.0, 200.0);
        let shape = engine.document().unwrap().selected().unwrap();
        assert_eq!(shape.style.fill, Some(Rgba::new(255, 0, 0, 255)));
    }

    #[test]
    fn test_shift_edge_resize_matches_other_axis() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        set_tool(&mut engine, Tool::Select);
        // E handle of the 200x100 rect sits at (300, 150)
        press(&mut engine, 300.0, 150.0);
        drag_mods(&mut engine, 150.0, 150.0, true, false);
        release(&mut engine, 150.0, 150.0);
        let shape = engine.document().unwrap().shape(id).unwrap();
        // Dragging inward stops at the height
        assert!((shape.width - 100.0).abs() < f64::EPSILON);
        assert!((shape.height - 100.0).abs() < f64::EPSILON);
        assert_eq!(shape.origin, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_rect_converts_to_polygon_in_place() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        engine.adjust_polygon_sides(1, SeedHint::Up).unwrap();
        let doc = engine.document().unwrap();
        let shape = doc.shape(id).unwrap();
        assert_eq!(shape.kind, ShapeKind::Polygon { sides: 5 });
        // Geometry is untouched by the conversion
        assert_eq!(shape.origin, Point::new(100.0, 100.0));
        assert!((shape.width - 200.0).abs() < f64::EPSILON);
        assert!((shape.height - 100.0).abs() < f64::EPSILON);
        let info = engine.selection_info().unwrap();
        assert_eq!(info.kind, "polygon");
        assert_eq!(info.sides, Some(5));
    }

    #[test]
    fn test_undo_reverts_polygon_conversion() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        engine.adjust_polygon_sides(1, SeedHint::Up).unwrap();
        assert!(engine.undo());
        let doc = engine.document().unwrap();
        assert_eq!(doc.shape(id).map(|s| s.kind), Some(ShapeKind::Rect));
        // Restoring a snapshot clears the selection
        assert_eq!(doc.selection(), None);
    }

    #[test]
    fn test_ellipse_conversion_follows_delta_sign() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Ellipse);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 200.0, 200.0);
        release(&mut engine, 200.0, 200.0);
        engine.adjust_polygon_sides(-1, SeedHint::Down).unwrap();
        let kind = engine.document().unwrap().selected().unwrap().kind;
        assert_eq!(kind, ShapeKind::Polygon { sides: 3 });
    }

    #[test]
    fn test_polygon_sides_stay_clamped() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Polygon);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 200.0, 200.0);
        release(&mut engine, 200.0, 200.0);
        engine.adjust_polygon_sides(100, SeedHint::Up).unwrap();
        assert_eq!(engine.selection_info().and_then(|i| i.sides), Some(MAX_SIDES));
        engine.adjust_polygon_sides(-200, SeedHint::Down).unwrap();
        assert_eq!(engine.selection_info().and_then(|i| i.sides), Some(MIN_SIDES));
    }

    #[test]
    fn test_adjust_sides_without_selection_errors() {
        let mut engine = engine();
        assert!(matches!(
            engine.adjust_polygon_sides(1, SeedHint::Up),
            Err(EngineError::NoSelection)
        ));
    }

    #[test]
    fn test_brush_then_eraser_leaves_transparency() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Brush);
        press(&mut engine, 400.0, 300.0);
        release(&mut engine, 400.0, 300.0);
        let painted = engine.document().unwrap().raster().pixel(400, 300).unwrap();
        assert_eq!(painted, Rgba::black());

        set_tool(&mut engine, Tool::Eraser);
        press(&mut engine, 400.0, 300.0);
        release(&mut engine, 400.0, 300.0);
        let erased = engine.document().unwrap().raster().pixel(400, 300).unwrap();
        assert_eq!(erased.a, 0);
    }

    #[test]
    fn test_undo_restores_raster_bytes() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Brush);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 200.0, 200.0);
        release(&mut engine, 200.0, 200.0);
        assert_eq!(
            engine.document().unwrap().raster().pixel(150, 150),
            Some(Rgba::black())
        );
        assert!(engine.undo());
        assert_eq!(
            engine.document().unwrap().raster().pixel(150, 150),
            Some(Rgba::white())
        );
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_n_mutations_then_n_undos() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Brush);
        for i in 0..3 {
            let x = 100.0 + i as f64 * 50.0;
            press(&mut engine, x, 100.0);
            release(&mut engine, x, 100.0);
        }
        assert_eq!(engine.history_len(), 3);
        for _ in 0..3 {
            assert!(engine.undo());
        }
        let doc = engine.document().unwrap();
        assert!(doc.shapes().is_empty());
        assert_eq!(doc.raster().pixel(100, 100), Some(Rgba::white()));
        assert!(!engine.undo());
    }

    #[test]
    fn test_history_is_capped() {
        let mut engine = engine();
        for _ in 0..90 {
            engine.clear();
        }
        assert_eq!(engine.history_len(), crate::history::HISTORY_CAP);
    }

    #[test]
    fn test_out_of_bounds_press_is_ignored() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Brush);
        engine.pointer_down(event(900.0, 300.0, 1));
        assert_eq!(engine.history_len(), 0);
        // No gesture started, so moves do nothing
        drag(&mut engine, 400.0, 300.0);
        assert_eq!(
            engine.document().unwrap().raster().pixel(400, 300),
            Some(Rgba::white())
        );
    }

    #[test]
    fn test_move_gesture_uses_fixed_offset() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        set_tool(&mut engine, Tool::Select);
        press(&mut engine, 150.0, 120.0);
        drag(&mut engine, 250.0, 220.0);
        release(&mut engine, 250.0, 220.0);
        let shape = engine.document().unwrap().shape(id).unwrap();
        assert_eq!(shape.origin, Point::new(200.0, 200.0));
        assert!((shape.width - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_from_corner_handle() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        set_tool(&mut engine, Tool::Select);
        // SE handle sits at (300, 200)
        press(&mut engine, 300.0, 200.0);
        drag(&mut engine, 340.0, 260.0);
        release(&mut engine, 340.0, 260.0);
        let shape = engine.document().unwrap().shape(id).unwrap();
        assert_eq!(shape.origin, Point::new(100.0, 100.0));
        assert!((shape.width - 240.0).abs() < f64::EPSILON);
        assert!((shape.height - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shift_resize_equalizes_axes() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        set_tool(&mut engine, Tool::Select);
        press(&mut engine, 300.0, 200.0);
        drag_mods(&mut engine, 400.0, 220.0, true, false);
        release(&mut engine, 400.0, 220.0);
        let shape = engine.document().unwrap().shape(id).unwrap();
        assert!((shape.width - shape.height).abs() < f64::EPSILON);
    }

    #[test]
    fn test_click_on_empty_clears_selection() {
        let mut engine = engine();
        make_rect(&mut engine);
        set_tool(&mut engine, Tool::Select);
        press(&mut engine, 700.0, 500.0);
        release(&mut engine, 700.0, 500.0);
        assert_eq!(engine.document().unwrap().selection(), None);
    }

    #[test]
    fn test_zero_buttons_move_acts_as_release() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 200.0, 180.0);
        engine.pointer_move(event(210.0, 190.0, 0));
        // Draft committed with the geometry from the last live move
        let doc = engine.document().unwrap();
        assert_eq!(doc.shapes().len(), 1);
        let shape = doc.selected().unwrap();
        assert!((shape.width - 100.0).abs() < f64::EPSILON);
        // And the gesture is over: further moves are ignored
        drag(&mut engine, 400.0, 400.0);
        assert!((engine.document().unwrap().selected().unwrap().width - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pointer_leave_aborts_creation() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 200.0, 200.0);
        engine.pointer_leave();
        assert!(engine.document().unwrap().shapes().is_empty());
        // The up for the dead gesture is a no-op
        release(&mut engine, 200.0, 200.0);
        assert!(engine.document().unwrap().shapes().is_empty());
    }

    #[test]
    fn test_other_pointer_is_ignored_mid_gesture() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 200.0, 200.0);
        engine.pointer_move(PointerInput::new(Point::new(500.0, 500.0), 2, 1));
        engine.pointer_up(PointerInput::new(Point::new(500.0, 500.0), 2, 0));
        release(&mut engine, 200.0, 200.0);
        let shape = engine.document().unwrap().selected().unwrap();
        assert!((shape.width - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_style_change_applies_to_selection() {
        let mut engine = engine();
        let id = make_rect(&mut engine);
        set_tool(&mut engine, Tool::Select);
        let before = engine.history_len();

        let mut config = engine.config().clone();
        config.fill = Some(Rgba::new(255, 0, 0, 255));
        engine.set_config(config);

        let shape = engine.document().unwrap().shape(id).unwrap();
        assert_eq!(shape.style.fill, Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(engine.history_len(), before + 1);
    }

    #[test]
    fn test_style_change_without_selection_is_config_only() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Select);
        let before = engine.history_len();
        let mut config = engine.config().clone();
        config.fill = Some(Rgba::new(0, 255, 0, 255));
        engine.set_config(config);
        assert_eq!(engine.history_len(), before);
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut engine = engine();
        make_rect(&mut engine);
        engine.clear();
        assert!(engine.document().unwrap().shapes().is_empty());
        assert!(engine.undo());
        assert_eq!(engine.document().unwrap().shapes().len(), 1);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Rect);
        let mut config = engine.config().clone();
        config.fill = Some(Rgba::black());
        engine.set_config(config);
        make_rect(&mut engine);

        let url = engine.export_image(None, None);
        assert!(url.starts_with("data:image/png;base64,"));
        engine.import_image(&url).unwrap();

        let doc = engine.document().unwrap();
        assert!(doc.shapes().is_empty());
        assert_eq!(doc.width(), 800);
        assert_eq!(doc.height(), 600);
        // The rect is baked into the raster now
        assert_eq!(doc.raster().pixel(200, 150), Some(Rgba::black()));
    }

    #[test]
    fn test_import_failure_leaves_shapes_alone() {
        let mut engine = engine();
        make_rect(&mut engine);
        assert!(engine.import_image("data:image/png;base64,!!!").is_err());
        assert_eq!(engine.document().unwrap().shapes().len(), 1);
    }

    #[test]
    fn test_aspect_ratio_growth() {
        let mut engine = engine();
        set_tool(&mut engine, Tool::Brush);
        press(&mut engine, 0.0, 0.0);
        release(&mut engine, 0.0, 0.0);

        assert!(engine.set_aspect_ratio("16:9"));
        let doc = engine.document().unwrap();
        assert_eq!(doc.width(), 1067);
        assert_eq!(doc.height(), 600);
        // Old content re-centered with integer offsets: (1067-800)/2 = 133
        assert_eq!(doc.raster().pixel(133, 0), Some(Rgba::black()));
        assert_eq!(doc.raster().pixel(0, 0), Some(Rgba::white()));
    }

    #[test]
    fn test_matching_ratio_skips_history() {
        let mut engine = engine();
        let before = engine.history_len();
        assert!(engine.set_aspect_ratio("4:3"));
        assert_eq!(engine.history_len(), before);
        assert_eq!(engine.document().unwrap().width(), 800);
    }

    #[test]
    fn test_malformed_ratio_rejected() {
        let mut engine = engine();
        for bad in ["", "abc", "16:", ":9", "16:9:2", "0:5", "16 : 9", "-4:3"] {
            assert!(!engine.set_aspect_ratio(bad), "accepted {bad:?}");
        }
        assert_eq!(engine.history_len(), 0);
        assert_eq!(engine.document().unwrap().width(), 800);
    }

    #[test]
    fn test_redraw_coalescing() {
        let mut engine = engine();
        assert!(engine.needs_present());
        engine.present();
        assert!(!engine.needs_present());
        set_tool(&mut engine, Tool::Brush);
        press(&mut engine, 100.0, 100.0);
        drag(&mut engine, 110.0, 110.0);
        assert!(engine.needs_present());
        engine.present();
        assert!(!engine.needs_present());
        release(&mut engine, 110.0, 110.0);
    }

    #[test]
    fn test_unmounted_engine_is_inert() {
        let mut engine = Engine::new();
        engine.pointer_down(event(10.0, 10.0, 1));
        assert_eq!(engine.history_len(), 0);
        assert!(!engine.undo());
        assert!(!engine.set_aspect_ratio("16:9"));
        assert!(matches!(engine.import_image("x"), Err(EngineError::NoDocument)));
        // Export still yields a valid data URL
        assert!(engine.export_image(None, None).starts_with("data:image/png"));
    }

    #[test]
    fn test_remount_preserves_document() {
        let mut engine = engine();
        make_rect(&mut engine);
        engine.unmount();
        engine.mount(400, 300, 2.0);
        let doc = engine.document().unwrap();
        assert_eq!(doc.shapes().len(), 1);
        assert_eq!(doc.width(), 800);
    }
}
