//! Linux-specific implementation for labrecord
//!
//! This crate hands rendered documents to the desktop's default viewer.

#![cfg(target_os = "linux")]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// Command used to open files with the desktop's preferred application.
const VIEWER_COMMAND: &str = "xdg-open";

/// Initialize Linux-specific components
///
/// # Errors
///
/// Returns an error if initialization fails
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    Ok(())
}

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// Name of the external program used to show documents.
#[must_use]
pub fn viewer_command() -> &'static str {
    VIEWER_COMMAND
}

/// Open a document in the desktop viewer.
///
/// The viewer hands the file off and exits; a background thread waits on it
/// so no zombie process is left behind. This does not block on the viewer.
///
/// # Errors
///
/// Returns an error if the viewer program cannot be spawned.
pub fn open_document(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Launching {VIEWER_COMMAND} for {}", path.display());
    launch(VIEWER_COMMAND, path)?;
    Ok(())
}

/// Spawn `program` on `path` and reap it on a background thread.
fn launch(program: &str, path: &Path) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let program = program.to_string();
    Ok(thread::spawn(move || {
        let status = child.wait();
        if let Ok(status) = &status {
            tracing::debug!("{program} exited with {status}");
        }
        status
    }))
}
