//! CPU rasterization primitives.
//!
//! Coordinates are `f64` in surface pixels; everything is clipped to the
//! target pixmap. No anti-aliasing; callers accept hard edges.

use crate::color::Rgba;
use crate::pixmap::Pixmap;
use kurbo::Point;

/// Pixel blending rule used when painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    /// Normal alpha blend over the destination.
    #[default]
    SourceOver,
    /// Erase: source coverage knocks out destination alpha.
    DestinationOut,
}

fn blend_pixel(pixmap: &mut Pixmap, x: i64, y: i64, color: Rgba, composite: Composite) {
    if x < 0 || y < 0 || x >= pixmap.width() as i64 || y >= pixmap.height() as i64 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let Some(dst) = pixmap.pixel(x, y) else {
        return;
    };
    let out = match composite {
        Composite::SourceOver => {
            let sa = color.a as u32;
            if sa == 255 {
                color
            } else if sa == 0 {
                dst
            } else {
                let da = dst.a as u32;
                let oa = sa + da * (255 - sa) / 255;
                if oa == 0 {
                    Rgba::transparent()
                } else {
                    let mix = |s: u8, d: u8| -> u8 {
                        let s = s as u32;
                        let d = d as u32;
                        (((s * sa + d * da * (255 - sa) / 255) / oa) as u8).min(255)
                    };
                    Rgba::new(
                        mix(color.r, dst.r),
                        mix(color.g, dst.g),
                        mix(color.b, dst.b),
                        oa as u8,
                    )
                }
            }
        }
        Composite::DestinationOut => {
            let keep = 255 - color.a as u32;
            Rgba::new(
                (dst.r as u32 * keep / 255) as u8,
                (dst.g as u32 * keep / 255) as u8,
                (dst.b as u32 * keep / 255) as u8,
                (dst.a as u32 * keep / 255) as u8,
            )
        }
    };
    pixmap.put_pixel(x, y, out);
}

/// Fill a solid disc, used for brush dabs and round caps/joins.
fn fill_disc(pixmap: &mut Pixmap, center: Point, radius: f64, color: Rgba, composite: Composite) {
    let radius = radius.max(0.5);
    let y0 = (center.y - radius).floor() as i64;
    let y1 = (center.y + radius).ceil() as i64;
    for y in y0..=y1 {
        let dy = y as f64 + 0.5 - center.y;
        let t = radius * radius - dy * dy;
        if t < 0.0 {
            continue;
        }
        let half = t.sqrt();
        let x0 = (center.x - half).floor() as i64;
        let x1 = (center.x + half).ceil() as i64;
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - center.x;
            if dx * dx + dy * dy <= radius * radius {
                blend_pixel(pixmap, x, y, color, composite);
            }
        }
    }
}

/// Paint one round-capped stroke segment (brush or eraser dab trail).
pub fn brush_segment(
    pixmap: &mut Pixmap,
    a: Point,
    b: Point,
    width: f64,
    color: Rgba,
    composite: Composite,
) {
    let radius = (width / 2.0).max(0.25);
    let dist = a.distance(b);
    if dist < f64::EPSILON {
        fill_disc(pixmap, a, radius, color, composite);
        return;
    }
    // Dab spacing of half a pixel keeps the trail solid at any width.
    let steps = (dist / 0.5).ceil() as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let p = Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
        fill_disc(pixmap, p, radius, color, composite);
    }
}

/// Stroke a polyline with round caps and joins.
pub fn stroke_polyline(pixmap: &mut Pixmap, points: &[Point], width: f64, color: Rgba, closed: bool) {
    if points.is_empty() {
        return;
    }
    if points.len() == 1 {
        fill_disc(pixmap, points[0], width / 2.0, color, Composite::SourceOver);
        return;
    }
    for w in points.windows(2) {
        brush_segment(pixmap, w[0], w[1], width, color, Composite::SourceOver);
    }
    if closed {
        brush_segment(
            pixmap,
            points[points.len() - 1],
            points[0],
            width,
            color,
            Composite::SourceOver,
        );
    }
}

/// Scanline even-odd fill of a closed polygon.
pub fn fill_polygon(pixmap: &mut Pixmap, points: &[Point], color: Rgba) {
    if points.len() < 3 {
        return;
    }
    let min_y = points.iter().fold(f64::MAX, |m, p| m.min(p.y));
    let max_y = points.iter().fold(f64::MIN, |m, p| m.max(p.y));
    let y0 = min_y.floor().max(0.0) as i64;
    let y1 = max_y.ceil().min(pixmap.height() as f64) as i64;

    let mut xs: Vec<f64> = Vec::new();
    for y in y0..y1 {
        let sample = y as f64 + 0.5;
        xs.clear();
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            // Half-open rule so shared vertices count once.
            if (a.y <= sample && b.y > sample) || (b.y <= sample && a.y > sample) {
                let t = (sample - a.y) / (b.y - a.y);
                xs.push(a.x + t * (b.x - a.x));
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let x0 = pair[0].round().max(0.0) as i64;
            let x1 = pair[1].round().min(pixmap.width() as f64) as i64;
            for x in x0..x1 {
                blend_pixel(pixmap, x, y, color, Composite::SourceOver);
            }
        }
    }
}

/// Fill an axis-aligned ellipse with exact per-row extents.
pub fn fill_ellipse(pixmap: &mut Pixmap, center: Point, rx: f64, ry: f64, color: Rgba) {
    let rx = rx.abs();
    let ry = ry.abs();
    if rx < f64::EPSILON || ry < f64::EPSILON {
        return;
    }
    let y0 = (center.y - ry).floor().max(0.0) as i64;
    let y1 = (center.y + ry).ceil().min(pixmap.height() as f64) as i64;
    for y in y0..y1 {
        let dy = (y as f64 + 0.5 - center.y) / ry;
        let t = 1.0 - dy * dy;
        if t < 0.0 {
            continue;
        }
        let half = rx * t.sqrt();
        let x0 = (center.x - half).round().max(0.0) as i64;
        let x1 = (center.x + half).round().min(pixmap.width() as f64) as i64;
        for x in x0..x1 {
            blend_pixel(pixmap, x, y, color, Composite::SourceOver);
        }
    }
}

/// Source-over blit of `src` into `dst`, scaled uniformly, nearest-neighbor.
/// `dst_origin` is the top-left of the scaled image in destination pixels.
pub fn blit_scaled(dst: &mut Pixmap, src: &Pixmap, dst_origin: Point, scale: f64) {
    if scale <= 0.0 {
        return;
    }
    let out_w = (src.width() as f64 * scale).round() as i64;
    let out_h = (src.height() as f64 * scale).round() as i64;
    let x0 = dst_origin.x.floor() as i64;
    let y0 = dst_origin.y.floor() as i64;
    for oy in 0..out_h {
        let ty = y0 + oy;
        if ty < 0 || ty >= dst.height() as i64 {
            continue;
        }
        let sy = ((oy as f64 + 0.5) / scale) as u32;
        let sy = sy.min(src.height() - 1);
        for ox in 0..out_w {
            let tx = x0 + ox;
            if tx < 0 || tx >= dst.width() as i64 {
                continue;
            }
            let sx = ((ox as f64 + 0.5) / scale) as u32;
            let sx = sx.min(src.width() - 1);
            if let Some(c) = src.pixel(sx, sy) {
                blend_pixel(dst, tx, ty, c, Composite::SourceOver);
            }
        }
    }
}
