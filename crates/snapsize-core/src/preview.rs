//! Live preview generation.
//!
//! The preview runs the exact render + encode pipeline the export uses,
//! so what the user sees is byte-identical to what they download. The
//! coordinator enforces the supersede rule: when edits arrive faster
//! than renders complete, only the newest result is ever shown, and a
//! failed render falls back to the last good preview instead of a blank
//! frame.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

use crate::encode::{encode_frame, EncodeError};
use crate::raster::{render_frame, RenderError};
use crate::state::ImageState;

/// Errors that can occur while producing a preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// An encoded preview frame with its display form.
#[derive(Debug, Clone)]
pub struct EncodedPreview {
    /// Canvas width of the rendered frame.
    pub width: u32,
    /// Canvas height of the rendered frame.
    pub height: u32,
    /// MIME type of the encoded bytes.
    pub mime: &'static str,
    /// The encoded image, identical to what an export would produce.
    pub bytes: Vec<u8>,
}

impl EncodedPreview {
    /// The preview as a base64 data URL for an `<img src>` binding.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Render and encode the current state exactly as an export would.
pub fn render_preview(state: &ImageState) -> Result<EncodedPreview, PreviewError> {
    let frame = render_frame(state)?;
    let bytes = encode_frame(&frame, state.format(), state.quality())?;

    Ok(EncodedPreview {
        width: frame.width,
        height: frame.height,
        mime: state.format().mime_type(),
        bytes,
    })
}

/// Serializes preview results so only the newest edit is displayed.
///
/// Each edit calls [`PreviewCoordinator::begin`] for a ticket; a
/// completion with a stale ticket is dropped. Within WASM the pipeline
/// is synchronous, but the page schedules renders asynchronously, so
/// completions can still arrive out of order relative to edits.
#[derive(Debug, Default)]
pub struct PreviewCoordinator {
    generation: u64,
    last_good: Option<EncodedPreview>,
}

impl PreviewCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new preview generation, superseding any outstanding one.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Record a completed render for the given ticket.
    ///
    /// Stale tickets and failures leave the current preview untouched.
    /// Returns the preview to display, if any.
    pub fn complete(
        &mut self,
        ticket: u64,
        result: Result<EncodedPreview, PreviewError>,
    ) -> Option<&EncodedPreview> {
        if ticket == self.generation {
            if let Ok(preview) = result {
                self.last_good = Some(preview);
            }
        }
        self.last_good.as_ref()
    }

    /// Render the state now and install the result in one step.
    pub fn refresh(&mut self, state: &ImageState) -> Option<&EncodedPreview> {
        let ticket = self.begin();
        let result = render_preview(state);
        self.complete(ticket, result)
    }

    /// The preview currently on display.
    pub fn current(&self) -> Option<&EncodedPreview> {
        self.last_good.as_ref()
    }

    /// Drop everything, e.g. when the session resets.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.last_good = None;
    }
}
