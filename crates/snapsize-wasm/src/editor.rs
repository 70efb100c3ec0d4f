//! The `ImageEditor` binding: one editing session for the page.
//!
//! Wraps the core store, crop session, preview coordinator and export
//! controller behind a single JavaScript class. All methods are
//! synchronous; the page schedules them off the interaction path.
//!
//! Errors cross the boundary as `JsValue` strings and are additionally
//! reported to the browser console.

use snapsize_core::crop::PointerPosition;
use snapsize_core::export::{BlobSink, ExportController, ExportError, SavedFile};
use snapsize_core::preview::PreviewCoordinator;
use snapsize_core::{
    Background, CropSession, EditorStore, Handle, OutputFormat, Viewport,
};
use wasm_bindgen::prelude::*;

use crate::types::JsSavedFile;

/// Log the error to the console and convert it for the JS caller.
fn js_error(err: impl std::fmt::Display) -> JsValue {
    let message = err.to_string();
    web_sys::console::error_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

/// The download itself is triggered by the page from the returned
/// `JsSavedFile`, so the core sink only has to accept delivery.
struct PageHandoff;

impl BlobSink for PageHandoff {
    fn save_blob(&mut self, _file: &SavedFile) -> Result<(), ExportError> {
        Ok(())
    }
}

/// A complete image editing session.
///
/// ```typescript
/// const editor = new ImageEditor();
/// editor.load(new Uint8Array(await file.arrayBuffer()));
/// editor.apply_preset(413, 531);
/// img.src = editor.render_preview();
/// const saved = editor.export();
/// ```
#[wasm_bindgen]
pub struct ImageEditor {
    store: EditorStore,
    crop: Option<CropSession>,
    preview: PreviewCoordinator,
    exporter: ExportController,
}

impl Default for ImageEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ImageEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ImageEditor {
        ImageEditor {
            store: EditorStore::new(),
            crop: None,
            preview: PreviewCoordinator::new(),
            exporter: ExportController::new(),
        }
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Decode uploaded bytes and begin a fresh session.
    ///
    /// On failure the previous session (if any) stays usable.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.store.load(bytes).map_err(js_error)?;
        self.crop = None;
        self.preview.clear();
        Ok(())
    }

    /// End the session and release the decoded pixels.
    pub fn reset(&mut self) {
        self.store.reset();
        self.crop = None;
        self.preview.clear();
    }

    #[wasm_bindgen(getter)]
    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    // ------------------------------------------------------------------
    // Snapshot getters for control binding
    // ------------------------------------------------------------------

    #[wasm_bindgen(getter)]
    pub fn source_width(&self) -> u32 {
        self.store.state().map_or(0, |s| s.source_width())
    }

    #[wasm_bindgen(getter)]
    pub fn source_height(&self) -> u32 {
        self.store.state().map_or(0, |s| s.source_height())
    }

    #[wasm_bindgen(getter)]
    pub fn target_width(&self) -> u32 {
        self.store.state().map_or(0, |s| s.target_width())
    }

    #[wasm_bindgen(getter)]
    pub fn target_height(&self) -> u32 {
        self.store.state().map_or(0, |s| s.target_height())
    }

    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> f64 {
        self.store.state().map_or(0.0, |s| s.rotation_degrees())
    }

    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> u8 {
        self.store.state().map_or(0, |s| s.quality())
    }

    /// Current format name: "jpeg", "png" or "webp".
    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.store
            .state()
            .map_or("jpeg", |s| s.format().name())
            .to_string()
    }

    /// Current background: "transparent" or "#RRGGBB".
    #[wasm_bindgen(getter)]
    pub fn background(&self) -> String {
        self.store
            .state()
            .map_or_else(|| "#FFFFFF".to_string(), |s| s.background().to_css())
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    /// The whole state summary as one object for frameworks that prefer
    /// a single subscription.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let state = self.store.state().ok_or_else(|| js_error("No image loaded"))?;
        serde_wasm_bindgen::to_value(&state.snapshot()).map_err(js_error)
    }

    // ------------------------------------------------------------------
    // Edit operations
    // ------------------------------------------------------------------

    /// Set the output dimensions, optionally deriving the other axis
    /// from the source aspect ratio.
    pub fn set_target_dimensions(&mut self, width: u32, height: u32, maintain_aspect: bool) {
        self.store.set_target_dimensions(width, height, maintain_aspect);
    }

    /// Set the rotation in degrees (any value, normalized to 0-360).
    pub fn set_rotation(&mut self, degrees: f64) {
        self.store.set_rotation(degrees);
    }

    /// Set the encoder quality (1-100, clamped).
    pub fn set_quality(&mut self, quality: u8) {
        self.store.set_quality(quality);
    }

    /// Set the output format by name ("jpeg"/"jpg"/"png"/"webp").
    pub fn set_format(&mut self, format: &str) -> Result<(), JsValue> {
        let format = OutputFormat::parse(format)
            .ok_or_else(|| js_error(format_args!("Unknown format: {format}")))?;
        self.store.set_format(format);
        Ok(())
    }

    /// Set the background: "transparent" or "#RRGGBB".
    pub fn set_background(&mut self, background: &str) -> Result<(), JsValue> {
        let background = Background::parse(background)
            .ok_or_else(|| js_error(format_args!("Invalid background: {background}")))?;
        self.store.set_background(background);
        Ok(())
    }

    /// Apply a fixed target size preset.
    pub fn apply_preset(&mut self, width: u32, height: u32) {
        self.store.apply_preset(width, height);
    }

    /// Undo the most recent destructive edit. Returns whether anything
    /// changed.
    pub fn undo(&mut self) -> bool {
        let undone = self.store.undo();
        if undone {
            // The source may have changed generation; a stale crop
            // selection could be out of bounds.
            self.crop = None;
        }
        undone
    }

    // ------------------------------------------------------------------
    // Crop mode
    // ------------------------------------------------------------------

    /// Enter crop mode with the default inset selection.
    ///
    /// `viewport_width`/`viewport_height` describe the on-screen canvas
    /// so pointer deltas can be mapped back to image pixels.
    pub fn begin_crop(&mut self, viewport_width: f64, viewport_height: f64) -> Result<(), JsValue> {
        let state = self.store.state().ok_or_else(|| js_error("No image loaded"))?;
        self.crop = Some(CropSession::new(
            state,
            Viewport::new(viewport_width, viewport_height),
        ));
        Ok(())
    }

    /// Whether crop mode is open.
    #[wasm_bindgen(getter)]
    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }

    /// Update the on-screen canvas size (e.g. on window resize).
    pub fn set_crop_viewport(&mut self, width: f64, height: f64) {
        if let Some(session) = self.crop.as_mut() {
            session.set_viewport(Viewport::new(width, height));
        }
    }

    /// Start dragging a handle ("move", "nw", "n", ..., "w").
    pub fn crop_pointer_down(&mut self, handle: &str, x: f64, y: f64) -> Result<(), JsValue> {
        let handle = Handle::parse(handle)
            .ok_or_else(|| js_error(format_args!("Unknown crop handle: {handle}")))?;
        if let Some(session) = self.crop.as_mut() {
            session.pointer_down(handle, PointerPosition::new(x, y));
        }
        Ok(())
    }

    /// Continue the drag. No-op outside a gesture.
    pub fn crop_pointer_move(&mut self, x: f64, y: f64) {
        if let Some(session) = self.crop.as_mut() {
            session.pointer_move(PointerPosition::new(x, y));
        }
    }

    /// End the drag (pointerup and pointercancel both land here).
    pub fn crop_pointer_up(&mut self) {
        if let Some(session) = self.crop.as_mut() {
            session.pointer_up();
        }
    }

    /// The tentative selection as `{ x, y, width, height }`.
    pub fn crop_rect(&self) -> Result<JsValue, JsValue> {
        let session = self.crop.as_ref().ok_or_else(|| js_error("Not in crop mode"))?;
        serde_wasm_bindgen::to_value(&session.tentative()).map_err(js_error)
    }

    /// Reset the tentative selection to the full frame.
    pub fn reset_crop_selection(&mut self) {
        if let Some(session) = self.crop.as_mut() {
            session.reset_selection();
        }
    }

    /// Commit the selection and leave crop mode.
    ///
    /// On rejection the selection stays for the user to adjust.
    pub fn apply_crop(&mut self) -> Result<(), JsValue> {
        let session = self.crop.as_ref().ok_or_else(|| js_error("Not in crop mode"))?;
        session.apply(&mut self.store).map_err(js_error)?;
        self.crop = None;
        Ok(())
    }

    /// Discard the selection and leave crop mode.
    pub fn cancel_crop(&mut self) {
        self.crop = None;
    }

    // ------------------------------------------------------------------
    // Preview and export
    // ------------------------------------------------------------------

    /// Render the current state and return it as a data URL.
    ///
    /// When the render fails but an earlier preview exists, the earlier
    /// preview is returned so the page never shows a blank frame.
    pub fn render_preview(&mut self) -> Result<String, JsValue> {
        let state = self.store.state().ok_or_else(|| js_error("No image loaded"))?;
        self.preview
            .refresh(state)
            .map(|preview| preview.data_url())
            .ok_or_else(|| js_error("Preview rendering failed"))
    }

    /// Render at full fidelity and encode for download.
    pub fn export(&mut self) -> Result<JsSavedFile, JsValue> {
        let state = self.store.state().ok_or_else(|| js_error("No image loaded"))?;
        let file = self
            .exporter
            .export_current(state, &mut PageHandoff)
            .map_err(js_error)?;
        // Hand-off back to the page is synchronous
        self.exporter.finish();
        Ok(JsSavedFile::from_saved(file))
    }
}
