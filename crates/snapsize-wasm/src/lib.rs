//! Snapsize WASM - WebAssembly bindings for Snapsize
//!
//! This crate exposes the snapsize-core editing session to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `editor` - The `ImageEditor` session class (state, crop, preview, export)
//! - `types` - WASM-compatible wrapper types for exported files
//!
//! # Usage
//!
//! ```typescript
//! import init, { ImageEditor, presets } from '@snapsize/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new ImageEditor();
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! editor.load(bytes);
//! console.log(`Loaded ${editor.source_width}x${editor.source_height}`);
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod types;

// Re-export public types
pub use editor::ImageEditor;
pub use types::JsSavedFile;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// The built-in target size presets as an array of
/// `{ name, width, height, category }` objects.
#[wasm_bindgen]
pub fn presets() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(snapsize_core::PRESETS)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
