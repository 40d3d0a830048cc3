//! Download file naming and saving.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};
use crate::render::{DocumentFormat, RenderedDocument};

/// Stem used when the course title yields nothing usable.
pub const FALLBACK_STEM: &str = "Lab_Record";

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 ]").expect("Invalid regex pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

/// Derive the download file name from a course title.
///
/// A course code before the first `-` is dropped, anything but ASCII letters,
/// digits and spaces is removed, and runs of spaces become `_`.
///
/// ```
/// use labrecord::download::download_filename;
/// use labrecord::DocumentFormat;
///
/// assert_eq!(
///     download_filename("CS101 - Intro to Programming", DocumentFormat::Pdf),
///     "Intro_to_Programming.pdf"
/// );
/// ```
#[must_use]
pub fn download_filename(course_title: &str, format: DocumentFormat) -> String {
    let title = course_title.trim();
    let name = match title.split_once('-') {
        Some((_, rest)) => rest.trim(),
        None => title,
    };

    let cleaned = DISALLOWED.replace_all(name, "");
    let stem = WHITESPACE.replace_all(cleaned.trim(), "_");
    let stem = if stem.is_empty() {
        FALLBACK_STEM
    } else {
        &*stem
    };

    format!("{stem}.{}", format.extension())
}

/// Write `document` into `dir` as `file_name`, creating `dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn save_document(dir: &Path, file_name: &str, document: &RenderedDocument) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    fs::write(&path, document.bytes())?;
    info!("Saved {} ({} bytes)", path.display(), document.len());
    Ok(path)
}
