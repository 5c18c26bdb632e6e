//! Image encoding/decoding and data-URL handling.
//!
//! Export never fails outward: the requested format is tried first, then
//! PNG, then an uncompressed raw payload that cannot fail to encode.

use crate::pixmap::Pixmap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageEncoder, ExtendedColorType};
use thiserror::Error;

/// Encoded image formats understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Errors raised while encoding or decoding images.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[from] png::EncodingError),
    #[error("malformed data URL")]
    InvalidDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid raw image payload")]
    InvalidRaw,
}

const RAW_MIME: &str = "image/x-raw";
const DEFAULT_JPEG_QUALITY: f64 = 0.92;

/// Encode a pixmap in the given format.
/// JPEG has no alpha channel, so the pixmap is composited onto white first.
pub fn encode(pixmap: &Pixmap, format: ImageFormat, quality: Option<f64>) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    match format {
        ImageFormat::Png => {
            let mut encoder = png::Encoder::new(&mut out, pixmap.width(), pixmap.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(pixmap.data())?;
        }
        ImageFormat::Jpeg => {
            let q = (quality.unwrap_or(DEFAULT_JPEG_QUALITY) * 100.0).clamp(1.0, 100.0) as u8;
            let rgb = composite_on_white(pixmap);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, q).write_image(
                &rgb,
                pixmap.width(),
                pixmap.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::WebP => {
            image::codecs::webp::WebPEncoder::new_lossless(&mut out).write_image(
                pixmap.data(),
                pixmap.width(),
                pixmap.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(out)
}

fn composite_on_white(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as u32;
            let over = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
            [over(px[0]), over(px[1]), over(px[2])]
        })
        .collect()
}

/// Flatten a pixmap into a base64 data URL.
/// Falls back from the requested format to PNG, then to an uncompressed raw
/// payload, so this function always returns *some* encoding.
pub fn export_data_url(pixmap: &Pixmap, format: Option<ImageFormat>, quality: Option<f64>) -> String {
    let requested = format.unwrap_or(ImageFormat::Png);
    match encode(pixmap, requested, quality) {
        Ok(bytes) => return to_data_url(requested.mime_type(), &bytes),
        Err(err) => log::warn!("{} export failed, falling back: {err}", requested.mime_type()),
    }
    if requested != ImageFormat::Png {
        if let Ok(bytes) = encode(pixmap, ImageFormat::Png, None) {
            return to_data_url(ImageFormat::Png.mime_type(), &bytes);
        }
    }
    to_data_url(RAW_MIME, &encode_raw(pixmap))
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn encode_raw(pixmap: &Pixmap) -> Vec<u8> {
    let mut bytes = format!("{}x{}:", pixmap.width(), pixmap.height()).into_bytes();
    bytes.extend_from_slice(pixmap.data());
    bytes
}

fn decode_raw(bytes: &[u8]) -> Result<Pixmap, CodecError> {
    let sep = bytes
        .iter()
        .position(|&b| b == b':')
        .ok_or(CodecError::InvalidRaw)?;
    let header = std::str::from_utf8(&bytes[..sep]).map_err(|_| CodecError::InvalidRaw)?;
    let (w, h) = header.split_once('x').ok_or(CodecError::InvalidRaw)?;
    let w: u32 = w.parse().map_err(|_| CodecError::InvalidRaw)?;
    let h: u32 = h.parse().map_err(|_| CodecError::InvalidRaw)?;
    let data = &bytes[sep + 1..];
    if data.len() != (w * h * 4) as usize {
        return Err(CodecError::InvalidRaw);
    }
    let mut pixmap = Pixmap::new(w, h);
    pixmap.data_mut().copy_from_slice(data);
    Ok(pixmap)
}

/// Decode raw encoded image bytes (PNG/JPEG/WebP) into a pixmap.
pub fn decode(bytes: &[u8]) -> Result<Pixmap, CodecError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    let (w, h) = (img.width(), img.height());
    let mut pixmap = Pixmap::new(w, h);
    pixmap.data_mut().copy_from_slice(img.as_raw());
    Ok(pixmap)
}

/// Decode a base64 data URL (or a bare base64 payload) into a pixmap.
pub fn decode_data_url(input: &str) -> Result<Pixmap, CodecError> {
    if let Some(rest) = input.strip_prefix("data:") {
        let (mime, payload) = rest.split_once(',').ok_or(CodecError::InvalidDataUrl)?;
        let mime = mime.strip_suffix(";base64").ok_or(CodecError::InvalidDataUrl)?;
        let bytes = STANDARD.decode(payload.trim())?;
        if mime == RAW_MIME {
            return decode_raw(&bytes);
        }
        return decode(&bytes);
    }
    // Bare base64 without the data: scheme.
    let bytes = STANDARD.decode(input.trim())?;
    decode(&bytes)
}
