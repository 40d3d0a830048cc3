//! Front-ends that feed [`UiEvent`]s to the controller.
//!
//! Each source runs as its own task and only ever sends messages; all state
//! lives in the controller.

pub mod shell;
pub mod watch;

use tokio::sync::mpsc;

use crate::controller::UiEvent;
use crate::error::Result;

pub use shell::{parse_command, ShellCommand, ShellSource};
pub use watch::FormFileWatcher;

/// A producer of UI events.
#[async_trait::async_trait]
pub trait EventSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Send events through `tx` until the source is exhausted or the
    /// receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input fails.
    async fn run(self: Box<Self>, tx: mpsc::Sender<UiEvent>) -> Result<()>;
}

/// Spawn `source` on the runtime, logging how it ended.
pub fn spawn(source: Box<dyn EventSource>, tx: mpsc::Sender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let name = source.name();
        tracing::debug!("Event source '{name}' started");
        match source.run(tx).await {
            Ok(()) => tracing::debug!("Event source '{name}' finished"),
            Err(e) => tracing::error!("Event source '{name}' failed: {e}"),
        }
    })
}
