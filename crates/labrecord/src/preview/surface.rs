//! A preview surface backed by a file on disk.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::PreviewSurface;
use crate::error::{Error, Result};
use crate::render::RenderedDocument;

/// Opens a file in an external viewer.
pub type Launcher =
    Box<dyn Fn(&Path) -> std::result::Result<(), Box<dyn std::error::Error>> + Send>;

/// Writes each previewed document to one file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// preview path, so a viewer watching the file never sees a partial write.
/// When a launcher is set, the viewer is started after the first write that
/// follows `open`.
pub struct FileSurface {
    path: PathBuf,
    launcher: Option<Launcher>,
    launch_pending: bool,
    writes: usize,
}

impl fmt::Debug for FileSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSurface")
            .field("path", &self.path)
            .field("has_launcher", &self.launcher.is_some())
            .field("launch_pending", &self.launch_pending)
            .field("writes", &self.writes)
            .finish()
    }
}

impl FileSurface {
    /// Create a surface writing to `path`, without a viewer.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            launcher: None,
            launch_pending: false,
            writes: 0,
        }
    }

    /// Start `launcher` with the preview path each time the preview opens.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// The preview file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of documents written so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn launch(&mut self) {
        self.launch_pending = false;
        if let Some(launcher) = &self.launcher {
            match launcher(&self.path) {
                Ok(()) => info!("Opened preview {}", self.path.display()),
                Err(e) => warn!("Could not open viewer for {}: {e}", self.path.display()),
            }
        }
    }
}

impl PreviewSurface for FileSurface {
    fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.launch_pending = true;
        Ok(())
    }

    fn display(&mut self, document: &RenderedDocument) -> Result<()> {
        let temp = self.temp_path();
        fs::write(&temp, document.bytes())?;
        fs::rename(&temp, &self.path)?;
        self.writes += 1;
        debug!(
            "Wrote preview {} ({} bytes)",
            self.path.display(),
            document.len()
        );

        if self.launch_pending {
            self.launch();
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.launch_pending = false;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
