//! Upload decoding pipeline for Snapsize.
//!
//! This module provides functionality for:
//! - Sniffing and decoding uploaded jpeg/png/webp files
//! - EXIF orientation correction for JPEG uploads
//! - The `SourceImage` RGBA buffer type the rest of the core operates on
//!
//! # Architecture
//!
//! Decoding is the only way pixels enter an editing session. All
//! operations are synchronous and single-threaded within WASM; the page
//! awaits them off the interaction path.

mod image;
mod types;

pub use image::{decode_image, get_orientation};
pub use types::{DecodeError, Orientation, SourceImage, MAX_PIXELS};
