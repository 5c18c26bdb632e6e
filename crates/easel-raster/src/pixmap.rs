//! Fixed-size RGBA8 pixel surface.

use crate::color::Rgba;

/// Byte length of a surface. Widened to `usize` before multiplying so
/// large dimensions do not wrap in `u32`.
fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Byte offset of pixel (x, y) in a surface of the given width.
fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

/// A width x height grid of RGBA8 pixels, origin top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Create a transparent pixmap. Zero dimensions are clamped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![0; buffer_len(width, height)],
        }
    }

    /// Create a pixmap filled with a solid color.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let mut pixmap = Self::new(width, height);
        pixmap.fill(color);
        pixmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite every pixel with a solid color.
    pub fn fill(&mut self, color: Rgba) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = color.a;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = pixel_offset(self.width, x, y);
        Some(Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    /// Write a pixel without blending. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = pixel_offset(self.width, x, y);
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = color.a;
    }

    /// Copy another pixmap into this one, centered, with integer offsets.
    /// Source pixels falling outside the destination are dropped.
    pub fn copy_from_centered(&mut self, src: &Pixmap) {
        let dx = (self.width as i64 - src.width as i64) / 2;
        let dy = (self.height as i64 - src.height as i64) / 2;
        for sy in 0..src.height {
            let ty = sy as i64 + dy;
            if ty < 0 || ty >= self.height as i64 {
                continue;
            }
            for sx in 0..src.width {
                let tx = sx as i64 + dx;
                if tx < 0 || tx >= self.width as i64 {
                    continue;
                }
                let si = pixel_offset(src.width, sx, sy);
                let ti = pixel_offset(self.width, tx as u32, ty as u32);
                self.data[ti..ti + 4].copy_from_slice(&src.data[si..si + 4]);
            }
        }
    }
}
