//! Document rendering.
//!
//! Both renderers take the same [`FormSnapshot`] and produce an in-memory
//! [`RenderedDocument`]. They share nothing else: the PDF renderer paginates
//! six rows per page and embeds QR images, while the DOCX renderer emits one
//! flowing table with a text placeholder. Each declares which of those it does
//! through [`DocumentRenderer::pagination`].

pub mod docx;
pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod qr;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DocumentConfig;
use crate::error::Result;
use crate::model::FormSnapshot;

pub use docx::DocxRenderer;
pub use pdf::PdfRenderer;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Portable Document Format.
    #[default]
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
}

impl DocumentFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// MIME type of the format.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How a renderer splits the experiment table across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Fixed number of table rows per page; header repeated on each page.
    Paginated {
        /// Data rows per page.
        rows_per_page: usize,
    },
    /// One continuous table; page breaks are left to the consuming app.
    Continuous,
}

/// A finished document held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    format: DocumentFormat,
    bytes: Vec<u8>,
    page_count: Option<usize>,
}

impl fmt::Debug for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedDocument")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .field("page_count", &self.page_count)
            .finish()
    }
}

impl RenderedDocument {
    /// Wrap rendered bytes.
    #[must_use]
    pub fn new(format: DocumentFormat, bytes: Vec<u8>, page_count: Option<usize>) -> Self {
        Self {
            format,
            bytes,
            page_count,
        }
    }

    /// Format of the document.
    #[must_use]
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Raw document bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-byte document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of pages, for paginated formats.
    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        self.page_count
    }
}

/// Turns a form snapshot into a document.
pub trait DocumentRenderer: fmt::Debug + Send + Sync {
    /// Format this renderer produces.
    fn format(&self) -> DocumentFormat;

    /// Page-splitting policy of this renderer.
    fn pagination(&self) -> Pagination;

    /// Render `snapshot`.
    ///
    /// Optional elements that cannot be produced (logo, QR code) are skipped,
    /// never reported as errors.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output backend itself fails.
    fn render(&self, snapshot: &FormSnapshot) -> Result<RenderedDocument>;
}

/// The two renderers, selectable by format.
#[derive(Debug, Default)]
pub struct Renderers {
    pdf: PdfRenderer,
    docx: DocxRenderer,
}

impl Renderers {
    /// Bundle the given renderers.
    #[must_use]
    pub fn new(pdf: PdfRenderer, docx: DocxRenderer) -> Self {
        Self { pdf, docx }
    }

    /// Build both renderers from the `[document]` config section.
    #[must_use]
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(PdfRenderer::from_config(config), DocxRenderer::from_config(config))
    }

    /// The renderer for `format`.
    #[must_use]
    pub fn get(&self, format: DocumentFormat) -> &dyn DocumentRenderer {
        match format {
            DocumentFormat::Pdf => &self.pdf,
            DocumentFormat::Docx => &self.docx,
        }
    }
}

/// Reorder an ISO `yyyy-mm-dd` date as `dd-mm-yyyy` for display.
///
/// Anything that does not split into exactly three `-`-separated parts is
/// returned unchanged. The parts themselves are not checked.
#[must_use]
pub fn format_date_display(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => format!("{day}-{month}-{year}"),
        _ => date.to_string(),
    }
}
