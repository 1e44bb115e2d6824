//! Image encoding: `DynamicImage` → PNG / JPEG / WebP bytes.
//!
//! JPEG drops the alpha channel (pages are opaque once rendered). WebP is
//! written lossless by the `image` crate, so the quality setting only ever
//! affects JPEG.

use crate::config::ImageFormat;
use crate::error::DocToolsError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat as Codec};
use std::io::Cursor;
use tracing::debug;

/// Encode `img` as `format`. `page` (1-indexed) is only used in errors.
pub fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
    page: usize,
) -> Result<Vec<u8>, DocToolsError> {
    let result = match format {
        ImageFormat::Png => encode_png(img),
        ImageFormat::Jpeg => encode_jpeg(img, jpeg_quality),
        ImageFormat::Webp => encode_webp(img),
    };
    let bytes = result.map_err(|e| DocToolsError::EncodeFailed {
        page,
        detail: e.to_string(),
    })?;
    debug!(
        "Encoded page {} as {} → {} bytes",
        page,
        format.extension(),
        bytes.len()
    );
    Ok(bytes)
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), Codec::Png)?;
    Ok(buf)
}

/// Baseline JPEG at `quality` (clamped to 1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let rgb = img.to_rgb8();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;
    Ok(buf)
}

pub fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut Cursor::new(&mut buf), Codec::WebP)?;
    Ok(buf)
}

/// `data:<mime>;base64,<payload>`.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn png_has_signature() {
        let bytes = encode_image(&red(10, 10), ImageFormat::Png, 100, 1).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn jpeg_has_soi_and_decodes_to_same_size() {
        let bytes = encode_image(&red(16, 8), ImageFormat::Jpeg, 60, 1).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8]));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn lower_quality_is_not_larger() {
        let noisy = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8, 255])
        }));
        let high = encode_jpeg(&noisy, 100).unwrap();
        let low = encode_jpeg(&noisy, 40).unwrap();
        assert!(low.len() <= high.len());
    }

    #[test]
    fn webp_has_riff_header() {
        let bytes = encode_image(&red(4, 4), ImageFormat::Webp, 50, 1).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn webp_is_lossless_and_ignores_quality() {
        let noisy = DynamicImage::ImageRgba8(RgbaImage::from_fn(24, 16, |x, y| {
            Rgba([(x * 11 % 256) as u8, (y * 17 % 256) as u8, ((x + y) % 256) as u8, 255])
        }));
        let low = encode_image(&noisy, ImageFormat::Webp, 10, 1).unwrap();
        let high = encode_image(&noisy, ImageFormat::Webp, 100, 1).unwrap();
        assert_eq!(low, high);
        let decoded = image::load_from_memory(&low).unwrap().to_rgba8();
        assert_eq!(decoded, noisy.to_rgba8());
    }

    #[test]
    fn data_uri_prefix() {
        let uri = data_uri("image/png", b"abc");
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }
}
