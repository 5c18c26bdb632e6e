//! Easel raster layer.
//!
//! CPU pixel surface, rasterization primitives and image codecs shared by the
//! drawing engine and its export path.

pub mod codec;
pub mod color;
pub mod draw;
pub mod pixmap;

pub use codec::{decode, decode_data_url, encode, export_data_url, CodecError, ImageFormat};
pub use color::Rgba;
pub use draw::{
    blit_scaled, brush_segment, fill_ellipse, fill_polygon, stroke_polyline, Composite,
};
pub use pixmap::Pixmap;
