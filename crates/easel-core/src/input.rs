//! Pointer input types and tool configuration.

use crate::shapes::{ShapeKind, ShapeStyle, DEFAULT_INNER_RATIO, DEFAULT_SIDES};
use easel_raster::Rgba;
use kurbo::Point;

/// Keyboard modifiers sampled with each pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
}

/// One pointer event, positioned in device surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub position: Point,
    pub pointer_id: u64,
    /// Pressed-button bitmask; 0 means no buttons are down.
    pub buttons: u32,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(position: Point, pointer_id: u64, buttons: u32) -> Self {
        Self { position, pointer_id, buttons, modifiers: Modifiers::default() }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// The active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    Select,
    #[default]
    Brush,
    Eraser,
    Line,
    Rect,
    Ellipse,
    Polygon,
    Star,
}

impl Tool {
    /// The shape kind this tool creates, if it is a shape tool.
    pub fn creates(&self) -> Option<ShapeKind> {
        match self {
            Tool::Line => Some(ShapeKind::Line),
            Tool::Rect => Some(ShapeKind::Rect),
            Tool::Ellipse => Some(ShapeKind::Ellipse),
            Tool::Polygon => Some(ShapeKind::Polygon { sides: DEFAULT_SIDES }),
            Tool::Star => Some(ShapeKind::Star {
                sides: DEFAULT_SIDES,
                inner_ratio: DEFAULT_INNER_RATIO,
            }),
            _ => None,
        }
    }
}

/// Externally owned tool settings, copied into the engine via `set_config`.
/// The engine reads these at every gesture and never mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub tool: Tool,
    /// Brush diameter in device pixels.
    pub brush_size: f64,
    pub brush_color: Rgba,
    pub stroke: Option<Rgba>,
    pub fill: Option<Rgba>,
    pub stroke_width: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            brush_size: 4.0,
            brush_color: Rgba::black(),
            stroke: Some(Rgba::black()),
            fill: None,
            stroke_width: 1.0,
        }
    }
}

impl ToolConfig {
    /// Style snapshot applied to newly created shapes.
    pub fn shape_style(&self) -> ShapeStyle {
        ShapeStyle {
            stroke: self.stroke,
            fill: self.fill,
            stroke_width: self.stroke_width.max(1.0),
        }
    }
}
