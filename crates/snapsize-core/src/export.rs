//! Export controller: render at full fidelity, encode, hand off.
//!
//! The controller owns the one piece of mutable export state, the
//! in-flight flag, so a click storm on the save button produces exactly
//! one download. The actual download mechanism lives behind the
//! [`BlobSink`] trait; the bindings crate supplies the browser one.

use thiserror::Error;

use crate::encode::{encode_frame, EncodeError};
use crate::raster::{render_frame, RenderError};
use crate::state::ImageState;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A previous export has not completed yet.
    #[error("An export is already in progress")]
    AlreadyExporting,

    #[error("Export failed while rendering: {0}")]
    Render(#[from] RenderError),

    #[error("Export failed while encoding: {0}")]
    Encode(#[from] EncodeError),

    /// The sink could not take delivery of the file.
    #[error("Export failed while saving: {0}")]
    Sink(String),
}

/// A fully encoded file ready to hand to the download machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Suggested filename, e.g. `edited-image-413x531.jpg`.
    pub name: String,
    /// MIME type of `bytes`.
    pub mime: &'static str,
    /// The encoded image.
    pub bytes: Vec<u8>,
}

/// Delivery target for an exported file.
///
/// Implementations report failures as [`ExportError::Sink`].
pub trait BlobSink {
    fn save_blob(&mut self, file: &SavedFile) -> Result<(), ExportError>;
}

/// Guards the export pipeline against concurrent runs.
///
/// An export is outstanding from a successful `export_current` until
/// the embedder calls [`ExportController::finish`], which the browser
/// layer does once the download hand-off returns.
#[derive(Debug, Default)]
pub struct ExportController {
    in_flight: bool,
}

impl ExportController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an export is outstanding.
    pub fn is_exporting(&self) -> bool {
        self.in_flight
    }

    /// Render the state at full fidelity, encode it, and deliver it.
    ///
    /// Nothing reaches the sink unless the whole pipeline succeeded, so
    /// a failure never produces a partial file.
    pub fn export_current(
        &mut self,
        state: &ImageState,
        sink: &mut dyn BlobSink,
    ) -> Result<SavedFile, ExportError> {
        if self.in_flight {
            return Err(ExportError::AlreadyExporting);
        }

        let frame = render_frame(state)?;
        let bytes = encode_frame(&frame, state.format(), state.quality())?;
        let file = SavedFile {
            name: export_filename(state),
            mime: state.format().mime_type(),
            bytes,
        };

        self.in_flight = true;
        if let Err(err) = sink.save_blob(&file) {
            self.in_flight = false;
            return Err(err);
        }

        Ok(file)
    }

    /// Mark the outstanding export as completed.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}

/// Download name derived from the configured target dimensions.
fn export_filename(state: &ImageState) -> String {
    format!(
        "edited-image-{}x{}.{}",
        state.target_width(),
        state.target_height(),
        state.format().extension()
    )
}
