//! Crop interaction engine.
//!
//! A pointer-driven state machine that turns device-space drag events
//! into a valid crop rectangle in image-space, independent of on-screen
//! scale. The selection is clamped at every pointer-move, not just at
//! commit, so what the user sees is always exactly what would be
//! committed.
//!
//! Every move is computed from the anchors captured at gesture start
//! rather than from the previous event, so coalesced or dropped
//! intermediate events cannot accumulate drift.

use crate::geometry::{display_scale, CropRect, Viewport};
use crate::state::{CropError, EditorStore, ImageState};
use crate::MIN_CROP_SIZE;

/// A named drag point on the crop selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// Drag inside the selection: translate it.
    Move,
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

impl Handle {
    /// Parse the lowercase handle names used by the DOM layer.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "move" => Some(Handle::Move),
            "nw" => Some(Handle::Nw),
            "n" => Some(Handle::N),
            "ne" => Some(Handle::Ne),
            "e" => Some(Handle::E),
            "se" => Some(Handle::Se),
            "s" => Some(Handle::S),
            "sw" => Some(Handle::Sw),
            "w" => Some(Handle::W),
            _ => None,
        }
    }

    /// Whether the west edge moves with this handle.
    fn moves_west_edge(self) -> bool {
        matches!(self, Handle::Nw | Handle::W | Handle::Sw)
    }

    /// Whether the east edge moves with this handle.
    fn moves_east_edge(self) -> bool {
        matches!(self, Handle::Ne | Handle::E | Handle::Se)
    }

    /// Whether the north edge moves with this handle.
    fn moves_north_edge(self) -> bool {
        matches!(self, Handle::Nw | Handle::N | Handle::Ne)
    }

    /// Whether the south edge moves with this handle.
    fn moves_south_edge(self) -> bool {
        matches!(self, Handle::Sw | Handle::S | Handle::Se)
    }
}

/// A pointer position in device (on-screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Anchors captured at gesture start and consumed on every move.
#[derive(Debug, Clone, Copy)]
struct CropGesture {
    handle: Handle,
    anchor_pointer: PointerPosition,
    anchor_rect: CropRect,
}

/// One crop-mode session against the current source.
///
/// States: idle (no gesture) or active (a handle is being dragged). The
/// tentative rectangle is only written into the image state when
/// [`CropSession::apply`] commits it.
#[derive(Debug)]
pub struct CropSession {
    source_width: u32,
    source_height: u32,
    viewport: Viewport,
    tentative: CropRect,
    gesture: Option<CropGesture>,
}

impl CropSession {
    /// Open crop mode with the default inset selection (10% margins).
    pub fn new(state: &ImageState, viewport: Viewport) -> Self {
        let (sw, sh) = (state.source_width(), state.source_height());
        Self {
            source_width: sw,
            source_height: sh,
            viewport,
            tentative: CropRect::inset(sw, sh),
            gesture: None,
        }
    }

    /// The current tentative (uncommitted) selection.
    pub fn tentative(&self) -> CropRect {
        self.tentative
    }

    /// Whether a drag gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Update the on-screen container size; takes effect on the next move.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Gesture start: capture the pointer and selection anchors.
    ///
    /// A second pointer-down while active restarts the gesture from the
    /// current selection (last pointer wins).
    pub fn pointer_down(&mut self, handle: Handle, position: PointerPosition) {
        self.gesture = Some(CropGesture {
            handle,
            anchor_pointer: position,
            anchor_rect: self.tentative,
        });
    }

    /// Gesture move: recompute the selection from the anchors.
    ///
    /// No-op while idle. The resulting rectangle always satisfies the
    /// bounds and minimum-size invariants.
    pub fn pointer_move(&mut self, position: PointerPosition) {
        let Some(gesture) = self.gesture else {
            return;
        };

        let scale = display_scale(self.viewport, self.source_width, self.source_height);
        let delta_x = (position.x - gesture.anchor_pointer.x) / scale;
        let delta_y = (position.y - gesture.anchor_pointer.y) / scale;

        self.tentative = apply_handle_rule(
            gesture.handle,
            gesture.anchor_rect,
            delta_x,
            delta_y,
            self.source_width,
            self.source_height,
        );
    }

    /// Gesture end (release or cancel): back to idle, selection kept.
    pub fn pointer_up(&mut self) {
        self.gesture = None;
    }

    /// Reset the selection to the full source bounds without committing.
    pub fn reset_selection(&mut self) {
        self.tentative = CropRect::full(self.source_width, self.source_height);
        self.gesture = None;
    }

    /// Commit the tentative selection into the store.
    ///
    /// On rejection the tentative rectangle is left in place for the
    /// user to adjust.
    pub fn apply<'a>(&self, store: &'a mut EditorStore) -> Result<&'a ImageState, CropError> {
        store.commit_crop(self.tentative)
    }
}

/// Apply one handle's geometric rule to the anchor rectangle.
///
/// Each axis is handled independently: east/south edges grow or shrink
/// the extent, west/north edges move the origin while the opposite edge
/// stays fixed. All coordinates are clamped before integer rounding so
/// the invariants hold after every single move.
fn apply_handle_rule(
    handle: Handle,
    anchor: CropRect,
    delta_x: f64,
    delta_y: f64,
    source_width: u32,
    source_height: u32,
) -> CropRect {
    let (sw, sh) = (source_width as f64, source_height as f64);
    let (ax, ay) = (anchor.x as f64, anchor.y as f64);
    let (aw, ah) = (anchor.width as f64, anchor.height as f64);
    let min_w = MIN_CROP_SIZE.min(source_width) as f64;
    let min_h = MIN_CROP_SIZE.min(source_height) as f64;

    if handle == Handle::Move {
        let x = (ax + delta_x).clamp(0.0, sw - aw);
        let y = (ay + delta_y).clamp(0.0, sh - ah);
        return CropRect::new(
            x.round() as u32,
            y.round() as u32,
            anchor.width,
            anchor.height,
        );
    }

    let (mut x, mut y) = (anchor.x, anchor.y);
    let (mut width, mut height) = (anchor.width, anchor.height);

    if handle.moves_east_edge() {
        // The upper bound is kept at or above the lower bound so a
        // degenerate anchor cannot invert the clamp range.
        width = (aw + delta_x).clamp(min_w, (sw - ax).max(min_w)).round() as u32;
    } else if handle.moves_west_edge() {
        // Keep the east edge fixed: derive the width from the rounded
        // origin so the sum stays exact.
        let new_x = (ax + delta_x)
            .clamp(0.0, (ax + aw - min_w).max(0.0))
            .round() as u32;
        width = anchor.x + anchor.width - new_x;
        x = new_x;
    }

    if handle.moves_south_edge() {
        height = (ah + delta_y).clamp(min_h, (sh - ay).max(min_h)).round() as u32;
    } else if handle.moves_north_edge() {
        let new_y = (ay + delta_y)
            .clamp(0.0, (ay + ah - min_h).max(0.0))
            .round() as u32;
        height = anchor.y + anchor.height - new_y;
        y = new_y;
    }

    CropRect::new(x, y, width, height)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
