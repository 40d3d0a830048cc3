//! Reload the form when its file changes on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::EventSource;
use crate::controller::UiEvent;
use crate::error::Result;
use crate::form::parse_form;
use crate::model::FormSnapshot;

/// Polls a form file and emits [`UiEvent::Reload`] when its bytes change.
#[derive(Debug)]
pub struct FormFileWatcher {
    path: PathBuf,
    poll_interval: Duration,
    last_hash: Option<blake3::Hash>,
}

impl FormFileWatcher {
    /// Watch `path`, checking every `poll_interval`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            last_hash: None,
        }
    }

    /// Treat `contents` as already seen, so only later edits reload.
    #[must_use]
    pub fn with_seen(mut self, contents: &[u8]) -> Self {
        self.last_hash = Some(blake3::hash(contents));
        self
    }

    /// The watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the file once.
    ///
    /// Returns `None` when the file is unreadable or unchanged since the
    /// last check. A changed file that fails to parse yields `Some(Err)` once
    /// and is not retried until its contents change again.
    pub fn poll_once(&mut self) -> Option<Result<FormSnapshot>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Cannot read {}: {e}", self.path.display());
                return None;
            }
        };

        let hash = blake3::hash(&bytes);
        if self.last_hash == Some(hash) {
            return None;
        }
        self.last_hash = Some(hash);
        Some(parse_form(&self.path, &bytes))
    }
}

#[async_trait::async_trait]
impl EventSource for FormFileWatcher {
    fn name(&self) -> &'static str {
        "watch"
    }

    async fn run(mut self: Box<Self>, tx: mpsc::Sender<UiEvent>) -> Result<()> {
        info!(
            "Watching {} every {:?}",
            self.path.display(),
            self.poll_interval
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = tx.closed() => break,
            }
            match self.poll_once() {
                Some(Ok(snapshot)) => {
                    debug!("{} changed; reloading", self.path.display());
                    if tx.send(UiEvent::Reload(snapshot)).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => warn!("Ignoring unparsable form file: {e}"),
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::logging::init_test_logging;

    const FORM: &str = r#"
course_title = "CS101 - Intro"
student_name = "Ada"

[[experiments]]
title = "Hello World"
"#;

    #[test]
    fn test_poll_once_reports_changes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.toml");
        fs::write(&path, FORM).unwrap();
        let mut watcher = FormFileWatcher::new(&path, Duration::from_millis(300));

        let snapshot = watcher.poll_once().unwrap().unwrap();
        assert_eq!(snapshot.student_name, "Ada");
        assert!(watcher.poll_once().is_none());

        fs::write(&path, FORM.replace("Ada", "Grace")).unwrap();
        let snapshot = watcher.poll_once().unwrap().unwrap();
        assert_eq!(snapshot.student_name, "Grace");
    }

    #[test]
    fn test_with_seen_skips_initial_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.toml");
        fs::write(&path, FORM).unwrap();

        let mut watcher =
            FormFileWatcher::new(&path, Duration::from_millis(300)).with_seen(FORM.as_bytes());
        assert!(watcher.poll_once().is_none());
    }

    #[test]
    fn test_bad_contents_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.toml");
        fs::write(&path, "course_title = [unclosed").unwrap();
        let mut watcher = FormFileWatcher::new(&path, Duration::from_millis(300));

        assert!(watcher.poll_once().unwrap().is_err());
        assert!(watcher.poll_once().is_none());
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FormFileWatcher::new(dir.path().join("absent.toml"), Duration::from_millis(300));
        assert!(watcher.poll_once().is_none());
    }

    #[tokio::test]
    async fn test_run_sends_reload_and_stops_with_receiver() {
        init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.toml");
        fs::write(&path, FORM).unwrap();

        let watcher = Box::new(FormFileWatcher::new(&path, Duration::from_millis(10)));
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(watcher.run(tx));

        match rx.recv().await {
            Some(UiEvent::Reload(snapshot)) => assert_eq!(snapshot.course_title, "CS101 - Intro"),
            other => panic!("expected a reload, got {other:?}"),
        }

        drop(rx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_skips_unparsable_contents_until_fixed() {
        init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.toml");
        fs::write(&path, "course_title = [unclosed").unwrap();

        let watcher = Box::new(FormFileWatcher::new(&path, Duration::from_millis(10)));
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(watcher.run(tx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        let staged = dir.path().join("form.toml.new");
        fs::write(&staged, FORM).unwrap();
        fs::rename(&staged, &path).unwrap();
        match rx.recv().await {
            Some(UiEvent::Reload(snapshot)) => assert_eq!(snapshot.student_name, "Ada"),
            other => panic!("expected a reload, got {other:?}"),
        }

        drop(rx);
        task.await.unwrap().unwrap();
    }
}
