//! Messages into and out of the controller.

use std::fmt;
use std::path::PathBuf;

use crate::model::{ExperimentField, FormField, FormSnapshot};
use crate::render::DocumentFormat;

/// A user action delivered by a front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Set a top-level field.
    SetField {
        /// Which field.
        field: FormField,
        /// New value, untrimmed.
        value: String,
    },
    /// Set one field of an experiment, addressed by its 1-based number.
    EditExperiment {
        /// Visual number of the block.
        number: usize,
        /// Which field.
        field: ExperimentField,
        /// New value, untrimmed.
        value: String,
    },
    /// Insert an empty block below block `after`, or at the end.
    AddBlock {
        /// Visual number of the block to insert below.
        after: Option<usize>,
    },
    /// Remove a block; the last remaining block is cleared instead.
    ClearBlock(usize),
    /// Render and show the preview now.
    Preview,
    /// Render and save a document.
    Download(DocumentFormat),
    /// Hide the preview.
    ClosePreview,
    /// Replace the whole form.
    Reload(FormSnapshot),
    /// Describe the current form.
    List,
    /// Close the preview and stop.
    Quit,
}

/// Feedback for the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Something went wrong; `0` is the message to show.
    Error(String),
    /// The status line error was cleared.
    ErrorCleared,
    /// The preview now shows a fresh render.
    PreviewUpdated {
        /// Pages in the new render.
        pages: usize,
    },
    /// The preview was closed.
    PreviewClosed,
    /// A document was written.
    Saved {
        /// Where it was written.
        path: PathBuf,
        /// What was written.
        format: DocumentFormat,
    },
    /// The number of blocks may have changed.
    BlocksChanged(String),
    /// Text description of the form.
    Listing(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "error: {message}"),
            Self::ErrorCleared => write!(f, "ok"),
            Self::PreviewUpdated { pages } if *pages == 1 => write!(f, "preview updated (1 page)"),
            Self::PreviewUpdated { pages } => write!(f, "preview updated ({pages} pages)"),
            Self::PreviewClosed => write!(f, "preview closed"),
            Self::Saved { path, format } => write!(f, "saved {format}: {}", path.display()),
            Self::BlocksChanged(label) => write!(f, "{label}"),
            Self::Listing(text) => write!(f, "{text}"),
        }
    }
}
