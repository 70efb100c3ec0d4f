//! Rasterization pipeline: scale, rotate, composite.
//!
//! Produces the pixel-exact RGBA frame that both the live preview and
//! the export encode. The pipeline is deterministic: the same state
//! always renders the same frame.
//!
//! # Algorithm
//!
//! 1. Scale the source to the target dimensions (Lanczos3).
//! 2. Fill a canvas with the effective background. The canvas swaps
//!    width and height for quarter-turn rotations so nothing is clipped;
//!    other angles keep the target extents and clip at the edges.
//! 3. Rotate the scaled image about the canvas center and composite it
//!    source-over the background. Exact quarter turns use index
//!    remapping; arbitrary angles use inverse mapping with bilinear
//!    interpolation: for each canvas pixel, find which scaled pixel(s)
//!    contribute to it and interpolate.

use image::RgbaImage;
use thiserror::Error;

use crate::geometry::{normalize_degrees, swaps_canvas_dimensions};
use crate::state::ImageState;
use crate::{Background, OutputFormat, Rgb};

/// Error types for frame rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The source pixel buffer does not match its declared dimensions.
    #[error("Source pixel buffer is inconsistent with its dimensions")]
    InvalidSourceBuffer,

    /// Target dimensions of zero cannot be rendered.
    #[error("Invalid render dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// A fully composited RGBA frame, ready for display or encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order.
    pub pixels: Vec<u8>,
}

impl RenderedFrame {
    /// View the frame as an `image::RgbaImage` for encoding.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Whether any pixel carries partial or full transparency.
    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks_exact(4).any(|px| px[3] < 255)
    }
}

/// The background actually painted, after the format policy.
///
/// JPEG has no alpha channel, so a transparent background silently
/// becomes opaque white rather than encoding as black.
pub fn effective_background(background: Background, format: OutputFormat) -> Background {
    match background {
        Background::Transparent if !format.supports_alpha() => Background::Solid(Rgb::WHITE),
        other => other,
    }
}

/// Render the current editing state into a composited frame.
pub fn render_frame(state: &ImageState) -> Result<RenderedFrame, RenderError> {
    let (target_w, target_h) = (state.target_width(), state.target_height());
    if target_w == 0 || target_h == 0 {
        return Err(RenderError::InvalidDimensions {
            width: target_w,
            height: target_h,
        });
    }

    let source = state
        .source()
        .to_rgba_image()
        .ok_or(RenderError::InvalidSourceBuffer)?;

    let scaled = if source.dimensions() == (target_w, target_h) {
        source
    } else {
        image::imageops::resize(
            &source,
            target_w,
            target_h,
            image::imageops::FilterType::Lanczos3,
        )
    };

    let rotation = normalize_degrees(state.rotation_degrees());
    let (canvas_w, canvas_h) = if swaps_canvas_dimensions(rotation) {
        (target_h, target_w)
    } else {
        (target_w, target_h)
    };

    let background = effective_background(state.background(), state.format());
    let bg_pixel = background_pixel(background);

    // Exact quarter turns are pure index remaps that cover the whole
    // canvas, so the rotated image just gets blended row by row.
    let rotated = quarter_turn(&scaled, rotation);
    let frame = match rotated {
        Some(rotated) => {
            debug_assert_eq!(rotated.dimensions(), (canvas_w, canvas_h));
            blend_over_background(&rotated, bg_pixel)
        }
        None => rotate_onto_canvas(&scaled, rotation, canvas_w, canvas_h, bg_pixel),
    };

    Ok(frame)
}

/// Background fill color as a non-premultiplied RGBA pixel.
fn background_pixel(background: Background) -> [u8; 4] {
    match background {
        Background::Transparent => [0, 0, 0, 0],
        Background::Solid(c) => [c.r, c.g, c.b, 255],
    }
}

/// Lossless rotation for multiples of 90 degrees, if applicable.
fn quarter_turn(image: &RgbaImage, rotation: f64) -> Option<RgbaImage> {
    if rotation.abs() < 0.001 {
        Some(image.clone())
    } else if (rotation - 90.0).abs() < 0.001 {
        Some(image::imageops::rotate90(image))
    } else if (rotation - 180.0).abs() < 0.001 {
        Some(image::imageops::rotate180(image))
    } else if (rotation - 270.0).abs() < 0.001 {
        Some(image::imageops::rotate270(image))
    } else {
        None
    }
}

/// Composite a full-coverage image source-over a uniform background.
fn blend_over_background(image: &RgbaImage, bg: [u8; 4]) -> RenderedFrame {
    let (width, height) = image.dimensions();
    let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);

    for px in image.pixels() {
        pixels.extend_from_slice(&blend_source_over(px.0, bg));
    }

    RenderedFrame {
        width,
        height,
        pixels,
    }
}

/// Rotate an image by an arbitrary angle onto a background-filled canvas.
///
/// Uses inverse mapping with bilinear interpolation. Canvas pixels whose
/// inverse-rotated coordinates fall outside the image show the
/// background; the image is clipped at the canvas extents.
fn rotate_onto_canvas(
    image: &RgbaImage,
    rotation_degrees: f64,
    canvas_w: u32,
    canvas_h: u32,
    bg: [u8; 4],
) -> RenderedFrame {
    let (src_w, src_h) = image.dimensions();

    // Positive angle rotates clockwise on screen, matching the 2D
    // canvas convention of y growing downward.
    let angle_rad = -rotation_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w as f64 / 2.0;
    let src_cy = src_h as f64 / 2.0;
    let dst_cx = canvas_w as f64 / 2.0;
    let dst_cy = canvas_h as f64 / 2.0;

    let mut pixels = Vec::with_capacity((canvas_w as usize) * (canvas_h as usize) * 4);

    for dst_y in 0..canvas_h {
        for dst_x in 0..canvas_w {
            let dx = dst_x as f64 - dst_cx;
            let dy = dst_y as f64 - dst_cy;

            // Inverse rotation back into scaled-image coordinates
            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            let sample = sample_bilinear(image, src_x - 0.5, src_y - 0.5);
            pixels.extend_from_slice(&blend_source_over(sample, bg));
        }
    }

    RenderedFrame {
        width: canvas_w,
        height: canvas_h,
        pixels,
    }
}

/// Sample an RGBA pixel using bilinear interpolation.
///
/// Coordinates outside the image return fully transparent so the
/// background shows through after compositing. Color channels are
/// weighted by alpha so transparent neighbors do not darken edges.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width() as i64, image.height() as i64);

    if x < -1.0 || x > w as f64 || y < -1.0 || y > h as f64 {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let mut color = [0.0f64; 3];
    let mut alpha = 0.0f64;
    let mut alpha_weight = 0.0f64;

    for (ky, wy) in [(y0, 1.0 - fy), (y0 + 1, fy)] {
        for (kx, wx) in [(x0, 1.0 - fx), (x0 + 1, fx)] {
            let weight = wx * wy;
            if weight == 0.0 || kx < 0 || kx >= w || ky < 0 || ky >= h {
                continue;
            }
            let px = image.get_pixel(kx as u32, ky as u32).0;
            let a = px[3] as f64;
            alpha += a * weight;
            alpha_weight += weight;
            color[0] += px[0] as f64 * a * weight;
            color[1] += px[1] as f64 * a * weight;
            color[2] += px[2] as f64 * a * weight;
        }
    }

    if alpha_weight == 0.0 || alpha <= 0.0 {
        return [0, 0, 0, 0];
    }

    [
        (color[0] / alpha).clamp(0.0, 255.0).round() as u8,
        (color[1] / alpha).clamp(0.0, 255.0).round() as u8,
        (color[2] / alpha).clamp(0.0, 255.0).round() as u8,
        alpha.clamp(0.0, 255.0).round() as u8,
    ]
}

/// Source-over blend of a non-premultiplied RGBA pixel onto a background.
fn blend_source_over(src: [u8; 4], bg: [u8; 4]) -> [u8; 4] {
    match src[3] {
        255 => src,
        0 => bg,
        _ => {
            let sa = src[3] as f64 / 255.0;
            let ba = bg[3] as f64 / 255.0;
            let out_a = sa + ba * (1.0 - sa);
            if out_a <= 0.0 {
                return [0, 0, 0, 0];
            }
            let channel = |s: u8, b: u8| -> u8 {
                let v = (s as f64 * sa + b as f64 * ba * (1.0 - sa)) / out_a;
                v.clamp(0.0, 255.0).round() as u8
            };
            [
                channel(src[0], bg[0]),
                channel(src[1], bg[1]),
                channel(src[2], bg[2]),
                (out_a * 255.0).round() as u8,
            ]
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
