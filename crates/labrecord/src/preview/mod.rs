//! Live preview.
//!
//! The coordinator holds at most one [`DocumentHandle`] at a time. Showing a
//! new document revokes the one it replaces; closing revokes the current one.

pub mod blob;
pub mod surface;

use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::render::RenderedDocument;

pub use blob::{BlobRegistry, DocumentHandle, HandleId};
pub use surface::FileSurface;

/// Whether the preview is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// Nothing shown.
    #[default]
    Closed,
    /// A document is on display.
    Open,
}

impl fmt::Display for PreviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Where previewed documents are displayed.
pub trait PreviewSurface: Send {
    /// Make the surface visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be prepared.
    fn open(&mut self) -> Result<()>;

    /// Replace the displayed document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be displayed.
    fn display(&mut self, document: &RenderedDocument) -> Result<()>;

    /// Hide the surface and drop what it shows.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be cleared.
    fn clear(&mut self) -> Result<()>;
}

/// Owns the preview surface and the handle currently on display.
#[derive(Debug)]
pub struct PreviewCoordinator<S> {
    surface: S,
    state: PreviewState,
    current: Option<DocumentHandle>,
}

impl<S: PreviewSurface> PreviewCoordinator<S> {
    /// Create a closed coordinator over `surface`.
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: PreviewState::Closed,
            current: None,
        }
    }

    /// Show `handle`, opening the surface first if needed.
    ///
    /// The previously shown handle, if any, is revoked. `handle` is kept even
    /// when displaying it fails, so it is released by the next `show` or
    /// `close`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to open or display.
    pub fn show(&mut self, handle: DocumentHandle) -> Result<()> {
        if self.state == PreviewState::Closed {
            self.surface.open()?;
            self.state = PreviewState::Open;
            debug!("Preview opened");
        }

        if let Some(previous) = self.current.take() {
            previous.revoke();
        }

        debug!("Showing {} in preview", handle.id());
        let result = self.surface.display(handle.document());
        self.current = Some(handle);
        result
    }

    /// Close the preview. Does nothing when already closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to clear.
    pub fn close(&mut self) -> Result<()> {
        if self.state == PreviewState::Closed {
            return Ok(());
        }

        if let Some(handle) = self.current.take() {
            handle.revoke();
        }
        self.state = PreviewState::Closed;
        debug!("Preview closed");
        self.surface.clear()
    }

    /// Whether the preview is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == PreviewState::Open
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// Id of the handle on display.
    #[must_use]
    pub fn current(&self) -> Option<HandleId> {
        self.current.as_ref().map(DocumentHandle::id)
    }

    /// The underlying surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// Surface that only counts calls. Shared by tests across modules.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub opens: usize,
    pub displays: usize,
    pub clears: usize,
    pub last_len: Option<usize>,
}

#[cfg(test)]
impl PreviewSurface for RecordingSurface {
    fn open(&mut self) -> Result<()> {
        self.opens += 1;
        Ok(())
    }

    fn display(&mut self, document: &RenderedDocument) -> Result<()> {
        self.displays += 1;
        self.last_len = Some(document.len());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        self.last_len = None;
        Ok(())
    }
}
