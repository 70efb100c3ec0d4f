//! Image encoding pipeline for Snapsize.
//!
//! This module provides functionality for:
//! - Encoding rendered frames to JPEG (lossy, configurable quality)
//! - Encoding rendered frames to PNG (lossless, alpha preserved)
//! - Encoding rendered frames to WebP (lossless, alpha preserved)
//!
//! # Architecture
//!
//! The encoders are pure functions over raw RGBA pixels. All operations
//! are synchronous and single-threaded within WASM.

mod jpeg;
mod png;
mod webp;

pub use jpeg::encode_jpeg;
pub use png::encode_png;
pub use webp::encode_webp;

use thiserror::Error;

use crate::raster::RenderedFrame;
use crate::OutputFormat;

/// Errors that can occur during frame encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying codec reported an error
    #[error("{format} encoding failed: {message}")]
    EncodingFailed { format: &'static str, message: String },
}

/// Validate frame dimensions and RGBA buffer length before encoding.
fn validate_rgba(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    Ok(())
}

/// Encode a rendered frame in the requested output format.
///
/// `quality` (1-100, clamped) applies to JPEG only; PNG and WebP encode
/// losslessly and ignore it.
pub fn encode_frame(
    frame: &RenderedFrame,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    match format {
        OutputFormat::Jpeg => encode_jpeg(&frame.pixels, frame.width, frame.height, quality),
        OutputFormat::Png => encode_png(&frame.pixels, frame.width, frame.height),
        OutputFormat::WebP => encode_webp(&frame.pixels, frame.width, frame.height),
    }
}
