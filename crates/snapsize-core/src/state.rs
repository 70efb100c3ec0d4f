//! Image state store: the single source of truth for an editing session.
//!
//! [`EditorStore`] owns the current [`ImageState`] and a bounded undo
//! history. All mutation goes through validated operations that either
//! succeed atomically or leave the prior state untouched; no invariant
//! violation ever becomes visible state.
//!
//! History policy: destructive operations (rotation, preset, crop commit)
//! push a snapshot of the state *before* the change. Continuously
//! adjustable settings (dimensions, background, quality, format) do not
//! push; they are reversible by re-adjustment rather than undo.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{decode_image, DecodeError, SourceImage};
use crate::geometry::{height_for_width, normalize_degrees, width_for_height, CropRect};
use crate::{Background, OutputFormat, DEFAULT_QUALITY, HISTORY_CAPACITY, MIN_CROP_SIZE};

/// Errors from committing a crop rectangle.
#[derive(Debug, Error)]
pub enum CropError {
    /// No image is loaded, so there is nothing to crop.
    #[error("No image loaded")]
    NoImage,

    /// The rectangle extends past the source bounds.
    #[error(
        "Crop region {x},{y} {width}x{height} exceeds the {source_width}x{source_height} source"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    /// The rectangle is below the minimum crop size.
    #[error("Crop region {width}x{height} is smaller than the {min_width}x{min_height} minimum")]
    TooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
}

/// The canonical description of the image and all pending edits.
///
/// Snapshots are cheap to clone: the decoded pixels sit behind an `Arc`
/// and are never mutated in place. Crop commits swap in a freshly
/// extracted buffer instead.
#[derive(Debug, Clone)]
pub struct ImageState {
    source: Arc<SourceImage>,
    target_width: u32,
    target_height: u32,
    rotation_degrees: f64,
    background: Background,
    quality: u8,
    format: OutputFormat,
}

impl ImageState {
    fn from_source(source: SourceImage) -> Self {
        let (width, height) = (source.width, source.height);
        Self {
            source: Arc::new(source),
            target_width: width.max(1),
            target_height: height.max(1),
            rotation_degrees: 0.0,
            background: Background::default(),
            quality: DEFAULT_QUALITY,
            format: OutputFormat::default(),
        }
    }

    /// The decoded source pixels (current crop generation).
    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Natural width of the current source.
    pub fn source_width(&self) -> u32 {
        self.source.width
    }

    /// Natural height of the current source.
    pub fn source_height(&self) -> u32 {
        self.source.height
    }

    /// Desired output width. Always at least 1.
    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Desired output height. Always at least 1.
    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Rotation in degrees, normalized to `[0, 360)`.
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    pub fn background(&self) -> Background {
        self.background
    }

    /// Encoder quality (1-100); meaningful for lossy output only.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// A serializable summary for UI bindings.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            source_width: self.source.width,
            source_height: self.source.height,
            target_width: self.target_width,
            target_height: self.target_height,
            rotation_degrees: self.rotation_degrees,
            background: self.background.to_css(),
            quality: self.quality,
            format: self.format,
        }
    }
}

/// Read-only summary of an [`ImageState`] for display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub rotation_degrees: f64,
    pub background: String,
    pub quality: u8,
    pub format: OutputFormat,
}

/// Owns the session state and its bounded undo history.
#[derive(Debug, Default)]
pub struct EditorStore {
    state: Option<ImageState>,
    history: VecDeque<ImageState>,
}

impl EditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an image is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// The current state, if an image is loaded.
    pub fn state(&self) -> Option<&ImageState> {
        self.state.as_ref()
    }

    /// Number of history entries currently held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Whether an undo would change anything.
    pub fn can_undo(&self) -> bool {
        self.history.len() > 1
    }

    /// Decode uploaded bytes and begin a fresh session.
    ///
    /// On decode failure the previous session (if any) is left untouched.
    pub fn load(&mut self, bytes: &[u8]) -> Result<&ImageState, DecodeError> {
        let source = decode_image(bytes)?;
        Ok(self.load_decoded(source))
    }

    /// Begin a fresh session from an already decoded source.
    pub fn load_decoded(&mut self, source: SourceImage) -> &ImageState {
        let state = ImageState::from_source(source);
        self.history.clear();
        self.history.push_back(state.clone());
        self.state.insert(state)
    }

    /// Set the desired output dimensions.
    ///
    /// With `maintain_aspect`, the dimension that changed drives and the
    /// other is derived from the source ratio. Both are clamped to >= 1.
    /// Non-destructive: no history push.
    pub fn set_target_dimensions(
        &mut self,
        width: u32,
        height: u32,
        maintain_aspect: bool,
    ) -> Option<&ImageState> {
        let state = self.state.as_mut()?;

        let (mut width, mut height) = (width.max(1), height.max(1));
        if maintain_aspect {
            let (sw, sh) = (state.source.width, state.source.height);
            if width != state.target_width {
                height = height_for_width(width, sw, sh);
            } else {
                width = width_for_height(height, sw, sh);
            }
        }

        state.target_width = width;
        state.target_height = height;
        self.state.as_ref()
    }

    /// Set the rotation, normalized to `[0, 360)`. Pushes history.
    pub fn set_rotation(&mut self, degrees: f64) -> Option<&ImageState> {
        self.state.as_ref()?;
        self.push_history();
        let state = self.state.as_mut()?;
        state.rotation_degrees = normalize_degrees(degrees);
        self.state.as_ref()
    }

    /// Set the canvas background. No history push.
    pub fn set_background(&mut self, background: Background) -> Option<&ImageState> {
        let state = self.state.as_mut()?;
        state.background = background;
        self.state.as_ref()
    }

    /// Set the encoder quality, clamped to 1-100. No history push.
    pub fn set_quality(&mut self, quality: u8) -> Option<&ImageState> {
        let state = self.state.as_mut()?;
        state.quality = quality.clamp(1, 100);
        self.state.as_ref()
    }

    /// Set the output format. No history push.
    pub fn set_format(&mut self, format: OutputFormat) -> Option<&ImageState> {
        let state = self.state.as_mut()?;
        state.format = format;
        self.state.as_ref()
    }

    /// Apply a fixed target size. Pushes history.
    pub fn apply_preset(&mut self, width: u32, height: u32) -> Option<&ImageState> {
        self.state.as_ref()?;
        self.push_history();
        let state = self.state.as_mut()?;
        state.target_width = width.max(1);
        state.target_height = height.max(1);
        self.state.as_ref()
    }

    /// Commit a crop: destructively replace the source with the cropped
    /// region and reset the target dimensions to the crop size.
    ///
    /// Pushes history before committing. On any validation failure no
    /// state changes.
    pub fn commit_crop(&mut self, rect: CropRect) -> Result<&ImageState, CropError> {
        let state = self.state.as_ref().ok_or(CropError::NoImage)?;
        let (sw, sh) = (state.source.width, state.source.height);

        if !rect.fits_within(sw, sh) {
            return Err(CropError::OutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                source_width: sw,
                source_height: sh,
            });
        }

        // Sources smaller than MIN_CROP_SIZE can still be cropped to their
        // full extent; the floor shrinks with the source.
        let min_width = MIN_CROP_SIZE.min(sw);
        let min_height = MIN_CROP_SIZE.min(sh);
        if rect.width < min_width || rect.height < min_height {
            return Err(CropError::TooSmall {
                width: rect.width,
                height: rect.height,
                min_width,
                min_height,
            });
        }

        self.push_history();
        let state = self.state.as_mut().ok_or(CropError::NoImage)?;
        let cropped = state.source.extract(rect);
        state.target_width = cropped.width;
        state.target_height = cropped.height;
        state.source = Arc::new(cropped);
        self.state.as_ref().ok_or(CropError::NoImage)
    }

    /// Restore the most recent history snapshot.
    ///
    /// Returns `false` (and changes nothing) when there is nothing to
    /// undo: the bottom entry is the loaded baseline and is never popped.
    pub fn undo(&mut self) -> bool {
        if self.history.len() <= 1 {
            return false;
        }
        if let Some(previous) = self.history.pop_back() {
            self.state = Some(previous);
            true
        } else {
            false
        }
    }

    /// End the session: release the source pixels and clear history.
    pub fn reset(&mut self) {
        self.state = None;
        self.history.clear();
    }

    /// Snapshot the current state before a destructive operation,
    /// evicting the oldest entry when the history is full.
    fn push_history(&mut self) {
        if let Some(state) = &self.state {
            if self.history.len() >= HISTORY_CAPACITY {
                self.history.pop_front();
            }
            self.history.push_back(state.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgb;

    /// Build a store with a flat-color source of the given size.
    fn loaded_store(width: u32, height: u32) -> EditorStore {
        let pixels = vec![200u8; (width * height * 4) as usize];
        let mut store = EditorStore::new();
        store.load_decoded(SourceImage::new(width, height, pixels));
        store
    }

    #[test]
    fn test_load_defaults() {
        let store = loaded_store(1000, 1200);
        let state = store.state().unwrap();

        assert_eq!(state.target_width(), 1000);
        assert_eq!(state.target_height(), 1200);
        assert_eq!(state.rotation_degrees(), 0.0);
        assert_eq!(state.background(), Background::Solid(Rgb::WHITE));
        assert_eq!(state.quality(), 90);
        assert_eq!(state.format(), OutputFormat::Jpeg);
        assert_eq!(store.history_len(), 1);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_load_invalid_bytes_keeps_previous_session() {
        let mut store = loaded_store(100, 100);
        store.apply_preset(50, 60);

        let result = store.load(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(result.is_err());

        // Previous session untouched
        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 50);
        assert_eq!(state.target_height(), 60);
    }

    #[test]
    fn test_set_dimensions_free() {
        let mut store = loaded_store(800, 600);
        store.set_target_dimensions(123, 77, false);

        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 123);
        assert_eq!(state.target_height(), 77);
        // Non-destructive: no history growth
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_set_dimensions_width_drives_aspect() {
        let mut store = loaded_store(800, 600);
        store.set_target_dimensions(400, 600, true);

        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 400);
        assert_eq!(state.target_height(), 300);
    }

    #[test]
    fn test_set_dimensions_height_drives_aspect() {
        let mut store = loaded_store(800, 600);
        // Width unchanged, height changed: height drives
        store.set_target_dimensions(800, 150, true);

        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 200);
        assert_eq!(state.target_height(), 150);
    }

    #[test]
    fn test_set_dimensions_clamps_to_one() {
        let mut store = loaded_store(100, 100);
        store.set_target_dimensions(0, 0, false);

        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 1);
        assert_eq!(state.target_height(), 1);
    }

    #[test]
    fn test_set_rotation_normalizes() {
        let mut store = loaded_store(100, 100);

        store.set_rotation(450.0);
        assert_eq!(store.state().unwrap().rotation_degrees(), 90.0);

        store.set_rotation(-90.0);
        assert_eq!(store.state().unwrap().rotation_degrees(), 270.0);

        store.set_rotation(720.0);
        assert_eq!(store.state().unwrap().rotation_degrees(), 0.0);
    }

    #[test]
    fn test_set_quality_clamps() {
        let mut store = loaded_store(100, 100);

        store.set_quality(0);
        assert_eq!(store.state().unwrap().quality(), 1);

        store.set_quality(200);
        assert_eq!(store.state().unwrap().quality(), 100);
    }

    #[test]
    fn test_apply_preset_ssc() {
        // Scenario: 1000x1200 source, SSC preset 200x230
        let mut store = loaded_store(1000, 1200);
        store.apply_preset(200, 230);

        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 200);
        assert_eq!(state.target_height(), 230);
        assert_eq!(state.source_width(), 1000);
        assert_eq!(state.source_height(), 1200);
    }

    #[test]
    fn test_commit_crop_replaces_source() {
        let mut store = loaded_store(800, 600);
        store
            .commit_crop(CropRect::new(100, 50, 400, 300))
            .unwrap();

        let state = store.state().unwrap();
        assert_eq!(state.source_width(), 400);
        assert_eq!(state.source_height(), 300);
        assert_eq!(state.target_width(), 400);
        assert_eq!(state.target_height(), 300);
    }

    #[test]
    fn test_commit_crop_full_frame_round_trip() {
        let mut store = loaded_store(800, 600);
        store.commit_crop(CropRect::full(800, 600)).unwrap();

        let state = store.state().unwrap();
        assert_eq!(state.source_width(), 800);
        assert_eq!(state.source_height(), 600);
        assert_eq!(state.target_width(), 800);
        assert_eq!(state.target_height(), 600);
    }

    #[test]
    fn test_commit_crop_out_of_bounds_rejected() {
        let mut store = loaded_store(200, 200);
        let result = store.commit_crop(CropRect::new(100, 100, 150, 150));
        assert!(matches!(result, Err(CropError::OutOfBounds { .. })));

        // No mutation on failure
        let state = store.state().unwrap();
        assert_eq!(state.source_width(), 200);
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_commit_crop_overflowing_origin_rejected() {
        // x + width exceeds u32::MAX; the wrapped sum must not sneak
        // past bounds validation
        let mut store = loaded_store(800, 600);
        let result = store.commit_crop(CropRect::new(4_294_966_000, 0, 2_000, 300));
        assert!(matches!(result, Err(CropError::OutOfBounds { .. })));

        let state = store.state().unwrap();
        assert_eq!(state.source_width(), 800);
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_commit_crop_too_small_rejected() {
        let mut store = loaded_store(200, 200);
        let result = store.commit_crop(CropRect::new(0, 0, 29, 100));
        assert!(matches!(result, Err(CropError::TooSmall { .. })));
    }

    #[test]
    fn test_commit_crop_tiny_source_full_frame_allowed() {
        // A 20x20 source is below MIN_CROP_SIZE; its full frame must
        // still be committable so the round-trip property holds.
        let mut store = loaded_store(20, 20);
        assert!(store.commit_crop(CropRect::full(20, 20)).is_ok());
    }

    #[test]
    fn test_commit_crop_no_image() {
        let mut store = EditorStore::new();
        let result = store.commit_crop(CropRect::new(0, 0, 100, 100));
        assert!(matches!(result, Err(CropError::NoImage)));
    }

    #[test]
    fn test_undo_restores_pre_operation_state() {
        let mut store = loaded_store(800, 600);
        store.set_rotation(90.0);

        assert!(store.can_undo());
        assert!(store.undo());

        let state = store.state().unwrap();
        assert_eq!(state.rotation_degrees(), 0.0);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_undo_after_two_presets() {
        // Scenario: preset(200,230), preset(413,531), undo -> 200x230
        let mut store = loaded_store(1000, 1200);
        store.apply_preset(200, 230);
        store.apply_preset(413, 531);

        assert!(store.undo());

        let state = store.state().unwrap();
        assert_eq!(state.target_width(), 200);
        assert_eq!(state.target_height(), 230);
    }

    #[test]
    fn test_undo_restores_cropped_source() {
        let mut store = loaded_store(800, 600);
        store
            .commit_crop(CropRect::new(100, 50, 400, 300))
            .unwrap();
        assert!(store.undo());

        let state = store.state().unwrap();
        assert_eq!(state.source_width(), 800);
        assert_eq!(state.source_height(), 600);
    }

    #[test]
    fn test_undo_on_fresh_load_is_noop() {
        let mut store = loaded_store(100, 100);
        assert!(!store.undo());
        assert!(store.state().is_some());
    }

    #[test]
    fn test_history_capacity_evicts_oldest() {
        let mut store = loaded_store(100, 100);
        for i in 0..(HISTORY_CAPACITY + 10) {
            store.apply_preset(50 + i as u32, 50);
        }
        assert_eq!(store.history_len(), HISTORY_CAPACITY);

        // Every remaining entry is still undoable except the bottom one
        let mut undos = 0;
        while store.undo() {
            undos += 1;
        }
        assert_eq!(undos, HISTORY_CAPACITY - 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = loaded_store(100, 100);
        store.apply_preset(50, 50);
        store.reset();

        assert!(!store.is_loaded());
        assert_eq!(store.history_len(), 0);
        assert!(!store.undo());
    }

    #[test]
    fn test_operations_before_load_are_noops() {
        let mut store = EditorStore::new();
        assert!(store.set_target_dimensions(10, 10, false).is_none());
        assert!(store.set_rotation(90.0).is_none());
        assert!(store.apply_preset(10, 10).is_none());
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut store = loaded_store(800, 600);
        store.set_quality(75);
        store.set_format(OutputFormat::Png);
        store.set_background(Background::Transparent);

        let snap = store.state().unwrap().snapshot();
        assert_eq!(snap.source_width, 800);
        assert_eq!(snap.quality, 75);
        assert_eq!(snap.format, OutputFormat::Png);
        assert_eq!(snap.background, "transparent");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn loaded_store(width: u32, height: u32) -> EditorStore {
        let pixels = vec![128u8; (width as usize) * (height as usize) * 4];
        let mut store = EditorStore::new();
        store.load_decoded(SourceImage::new(width, height, pixels));
        store
    }

    proptest! {
        /// Property: maintained aspect stays within 1 px of the source ratio
        /// when width drives.
        #[test]
        fn prop_aspect_maintained_width_driven(
            (sw, sh) in (2u32..=2000, 2u32..=2000),
            width in 1u32..=2000,
        ) {
            let mut store = loaded_store(sw, sh);
            store.set_target_dimensions(width, sh, true);

            let state = store.state().unwrap();
            if state.target_width() == width {
                let expected = width as f64 * sh as f64 / sw as f64;
                prop_assert!((state.target_height() as f64 - expected).abs() <= 1.0);
            }
        }

        /// Property: target dimensions never drop below 1.
        #[test]
        fn prop_target_dimensions_positive(
            (sw, sh) in (1u32..=500, 1u32..=500),
            (w, h) in (0u32..=500, 0u32..=500),
            maintain in any::<bool>(),
        ) {
            let mut store = loaded_store(sw, sh);
            store.set_target_dimensions(w, h, maintain);

            let state = store.state().unwrap();
            prop_assert!(state.target_width() >= 1);
            prop_assert!(state.target_height() >= 1);
        }

        /// Property: rotation is always stored in [0, 360) and is
        /// equivalent modulo full turns.
        #[test]
        fn prop_rotation_normalized(
            degrees in -10_000.0f64..=10_000.0,
            k in -3i32..=3,
        ) {
            let mut a = loaded_store(10, 10);
            let mut b = loaded_store(10, 10);

            a.set_rotation(degrees);
            b.set_rotation(degrees + 360.0 * k as f64);

            let ra = a.state().unwrap().rotation_degrees();
            let rb = b.state().unwrap().rotation_degrees();
            prop_assert!((0.0..360.0).contains(&ra));
            prop_assert!((ra - rb).abs() < 1e-6);
        }

        /// Property: undo after a destructive operation restores the
        /// exact prior target dimensions and rotation.
        #[test]
        fn prop_undo_restores_previous(
            presets in prop::collection::vec((1u32..=1000, 1u32..=1000), 1..6),
        ) {
            let mut store = loaded_store(640, 480);

            let mut before = (640, 480);
            for (i, (w, h)) in presets.iter().enumerate() {
                if i == presets.len() - 1 {
                    let s = store.state().unwrap();
                    before = (s.target_width(), s.target_height());
                }
                store.apply_preset(*w, *h);
            }

            prop_assert!(store.undo());
            let state = store.state().unwrap();
            prop_assert_eq!((state.target_width(), state.target_height()), before);
        }

        /// Property: a committed crop always leaves source == target size
        /// and within the old bounds.
        #[test]
        fn prop_commit_crop_consistent(
            (sw, sh) in (60u32..=400, 60u32..=400),
            (x, y) in (0u32..=50, 0u32..=50),
            (w, h) in (30u32..=200, 30u32..=200),
        ) {
            let mut store = loaded_store(sw, sh);
            let rect = CropRect::new(x, y, w, h);

            let committed = store.commit_crop(rect).is_ok();
            let state = store.state().unwrap();
            if committed {
                prop_assert!(rect.fits_within(sw, sh));
                prop_assert_eq!(state.source_width(), w);
                prop_assert_eq!(state.source_height(), h);
                prop_assert_eq!(state.target_width(), w);
                prop_assert_eq!(state.target_height(), h);
            } else {
                // Rejected commits leave everything untouched
                prop_assert_eq!(state.source_width(), sw);
                prop_assert_eq!(state.source_height(), sh);
            }
        }
    }
}
