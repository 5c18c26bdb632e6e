//! Drawing and editing engine for a hybrid raster+vector document.
//!
//! A [`Document`] pairs one raster buffer (freehand brush and eraser
//! strokes, imported images) with an ordered list of parametric shapes.
//! The [`Engine`] facade drives everything from pointer events: shape
//! creation, selection, move/resize handles, bounded undo history, view
//! fitting, and flatten/export through the codecs in `easel-raster`.

pub mod document;
pub mod engine;
pub mod history;
pub mod input;
pub mod render;
pub mod selection;
pub mod shapes;
pub mod view;

pub use document::Document;
pub use engine::{Engine, EngineError, SeedHint, SelectionInfo};
pub use history::{History, HistoryEntry, HISTORY_CAP};
pub use input::{Modifiers, PointerInput, Tool, ToolConfig};
pub use render::{flatten, RedrawScheduler};
pub use selection::{handle_at, DragState, HandleKind, HANDLE_SIZE};
pub use shapes::{Shape, ShapeId, ShapeKind, ShapeStyle};
pub use view::ViewTransform;

pub use easel_raster::{ImageFormat, Pixmap, Rgba};
