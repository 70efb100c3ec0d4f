//! Geometry and coordinate-transform utilities.
//!
//! Pure functions shared by the crop interaction engine and the state
//! store: display-space to image-space mapping, aspect-ratio derivation,
//! and rotation normalization. Everything here operates on image-space
//! pixel coordinates unless noted otherwise.

/// A crop rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full-frame rectangle for a source of the given size.
    pub fn full(source_width: u32, source_height: u32) -> Self {
        Self::new(0, 0, source_width, source_height)
    }

    /// The default crop-mode selection: a 10% margin on each side.
    ///
    /// Each axis independently falls back to the full extent when the
    /// inset would leave a selection below the minimum crop size, so the
    /// default is always a committable rectangle.
    pub fn inset(source_width: u32, source_height: u32) -> Self {
        let min_w = crate::MIN_CROP_SIZE.min(source_width);
        let min_h = crate::MIN_CROP_SIZE.min(source_height);
        let mut margin_x = (source_width as f64 * 0.1).round() as u32;
        let mut margin_y = (source_height as f64 * 0.1).round() as u32;
        let mut width = source_width.saturating_sub(margin_x * 2);
        let mut height = source_height.saturating_sub(margin_y * 2);
        if width < min_w {
            margin_x = 0;
            width = source_width;
        }
        if height < min_h {
            margin_y = 0;
            height = source_height;
        }
        Self::new(margin_x, margin_y, width, height)
    }

    /// Exclusive right edge (`x + width`). Only meaningful for rectangles
    /// that already passed [`CropRect::fits_within`].
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge (`y + height`). Only meaningful for rectangles
    /// that already passed [`CropRect::fits_within`].
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the rectangle lies entirely within a source of the given size.
    ///
    /// Edge sums are computed in u64 so rectangles whose `x + width`
    /// overflows u32 are rejected instead of wrapping.
    pub fn fits_within(&self, source_width: u32, source_height: u32) -> bool {
        self.x as u64 + self.width as u64 <= source_width as u64
            && self.y as u64 + self.height as u64 <= source_height as u64
    }

    /// Whether this rectangle covers the entire source.
    pub fn is_full(&self, source_width: u32, source_height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == source_width && self.height == source_height
    }
}

/// The on-screen container the image is displayed in, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Factor mapping image-space pixels to on-screen pixels.
///
/// The image is scaled down to fit the viewport but never scaled up, so
/// the factor is capped at 1.0. Returns 1.0 for degenerate inputs so
/// pointer deltas stay finite.
pub fn display_scale(viewport: Viewport, source_width: u32, source_height: u32) -> f64 {
    if source_width == 0 || source_height == 0 || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return 1.0;
    }
    (viewport.width / source_width as f64)
        .min(viewport.height / source_height as f64)
        .min(1.0)
}

/// Derive the height that preserves the source aspect ratio for a given
/// width. Clamped to at least 1.
pub fn height_for_width(width: u32, source_width: u32, source_height: u32) -> u32 {
    if source_width == 0 {
        return 1;
    }
    let height = (width as f64 * source_height as f64 / source_width as f64).round() as u32;
    height.max(1)
}

/// Derive the width that preserves the source aspect ratio for a given
/// height. Clamped to at least 1.
pub fn width_for_height(height: u32, source_width: u32, source_height: u32) -> u32 {
    if source_height == 0 {
        return 1;
    }
    let width = (height as f64 * source_width as f64 / source_height as f64).round() as u32;
    width.max(1)
}

/// Normalize a rotation in degrees to the range `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for inputs like -1e-16
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Whether a normalized rotation swaps the canvas width and height.
pub fn swaps_canvas_dimensions(degrees: f64) -> bool {
    let normalized = normalize_degrees(degrees);
    (normalized - 90.0).abs() < 0.001 || (normalized - 270.0).abs() < 0.001
}


// ============================================================================
// Property-Based Tests
// ============================================================================
