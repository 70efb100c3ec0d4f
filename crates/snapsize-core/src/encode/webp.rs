//! WebP encoding for export.
//!
//! The `image` crate ships a lossless WebP encoder only, so WebP output
//! is always lossless and the quality slider has no effect on it. Alpha
//! is preserved.

use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{validate_rgba, EncodeError};

/// Encode RGBA pixel data to lossless WebP bytes.
pub fn encode_webp(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    validate_rgba(pixels, width, height)?;

    let mut buffer = Cursor::new(Vec::new());
    let encoder = WebPEncoder::new_lossless(&mut buffer);
    encoder
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: "WebP",
            message: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_webp_basic() {
        let pixels = vec![128u8; 32 * 32 * 4];

        let webp_bytes = encode_webp(&pixels, 32, 32).unwrap();
        assert_eq!(&webp_bytes[0..4], b"RIFF");
        assert_eq!(&webp_bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_encode_webp_lossless_round_trip() {
        let mut pixels = Vec::with_capacity(16 * 16 * 4);
        for i in 0..(16 * 16) {
            let v = (i % 256) as u8;
            pixels.extend_from_slice(&[v, v.wrapping_mul(3), v.wrapping_add(7), 255]);
        }

        let webp_bytes = encode_webp(&pixels, 16, 16).unwrap();
        let decoded = image::load_from_memory(&webp_bytes).unwrap().into_rgba8();
        assert_eq!(decoded.into_raw(), pixels);
    }

    #[test]
    fn test_encode_webp_preserves_alpha() {
        let pixels = vec![100, 100, 100, 64].repeat(4 * 4);

        let webp_bytes = encode_webp(&pixels, 4, 4).unwrap();
        let decoded = image::load_from_memory(&webp_bytes).unwrap().into_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 64);
    }

    #[test]
    fn test_encode_webp_invalid_input() {
        let result = encode_webp(&[], 10, 0);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));

        let result = encode_webp(&[0u8; 7], 10, 10);
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }
}
