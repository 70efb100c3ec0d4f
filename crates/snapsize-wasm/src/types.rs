//! WASM-compatible wrapper types.
//!
//! JavaScript-friendly views over the core types, handling the
//! conversion between Rust and JavaScript data representations.

use snapsize_core::export::SavedFile;
use wasm_bindgen::prelude::*;

/// An exported file wrapper for JavaScript.
///
/// # Memory Management
///
/// The encoded bytes are stored in WASM memory. When you call `bytes()`,
/// a copy is made to JavaScript memory as a `Uint8Array` for safe
/// hand-off to `Blob` and the download anchor. The `free()` method can
/// be called to explicitly release WASM memory, but this is optional as
/// wasm-bindgen's finalizer will handle cleanup automatically.
#[wasm_bindgen]
pub struct JsSavedFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl JsSavedFile {
    /// Suggested download filename, e.g. `edited-image-413x531.jpg`.
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// MIME type for the `Blob` constructor.
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.mime.clone()
    }

    /// Size of the encoded file in bytes.
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// The encoded file as a `Uint8Array` copy.
    pub fn bytes(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.bytes[..])
    }

    /// Explicitly free WASM memory.
    ///
    /// Optional - wasm-bindgen's finalizer will handle cleanup
    /// automatically.
    pub fn free_bytes(self) {
        // Dropping self releases the memory
    }
}

impl JsSavedFile {
    /// Wrap a core export result for the JavaScript side.
    pub(crate) fn from_saved(file: SavedFile) -> Self {
        Self {
            name: file.name,
            mime: file.mime.to_string(),
            bytes: file.bytes,
        }
    }
}
