//! The UI controller.
//!
//! A single task owns the form, the preview and the renderers. It reacts to
//! three things: [`UiEvent`]s from the front-ends, change notifications from
//! the experiment block store, and the one debounce deadline. Edits push the
//! deadline back; when it passes, the preview is re-rendered. Explicit
//! preview and download requests skip the debounce, though not validation.

pub mod event;

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, trace};

use crate::config::Config;
use crate::download::{download_filename, save_document};
use crate::error::Error;
use crate::form::Form;
use crate::model::{BlockId, FormField, FormSnapshot, RemoveOutcome, StoreChange};
use crate::preview::{BlobRegistry, PreviewCoordinator, PreviewSurface};
use crate::render::{DocumentFormat, Renderers};

pub use event::{Notice, UiEvent};

/// Default quiet period before an edit refreshes the preview.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Tunables for a [`Controller`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Quiet period before an edit refreshes an open preview.
    pub debounce: Duration,
    /// Directory downloads are written to.
    pub output_dir: PathBuf,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ControllerOptions {
    /// Take the debounce and output directory from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            output_dir: config.output_dir(),
        }
    }
}

/// Owns the editing session.
#[derive(Debug)]
pub struct Controller<S> {
    form: Form,
    preview: PreviewCoordinator<S>,
    renderers: Renderers,
    registry: BlobRegistry,
    options: ControllerOptions,
    status: Option<String>,
    deadline: Option<Instant>,
    store_changes: mpsc::UnboundedReceiver<StoreChange>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl<S: PreviewSurface> Controller<S> {
    /// Create a controller. `form`'s block store observer is taken over.
    #[must_use]
    pub fn new(
        mut form: Form,
        surface: S,
        renderers: Renderers,
        options: ControllerOptions,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        let (store_tx, store_changes) = mpsc::unbounded_channel();
        form.blocks_mut().on_change(move |change| {
            let _ = store_tx.send(change.clone());
        });

        Self {
            form,
            preview: PreviewCoordinator::new(surface),
            renderers,
            registry: BlobRegistry::new(),
            options,
            status: None,
            deadline: None,
            store_changes,
            notices,
        }
    }

    /// The form being edited.
    #[must_use]
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// The preview coordinator.
    #[must_use]
    pub fn preview(&self) -> &PreviewCoordinator<S> {
        &self.preview
    }

    /// Registry of published documents.
    #[must_use]
    pub fn registry(&self) -> &BlobRegistry {
        &self.registry
    }

    /// The status line error, if one is showing.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether a debounced refresh is waiting.
    #[must_use]
    pub fn refresh_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Process events until [`UiEvent::Quit`] or until every sender is gone.
    ///
    /// The preview is closed before returning.
    pub async fn run(mut self, mut events: mpsc::Receiver<UiEvent>) -> Self {
        info!("Controller started");
        loop {
            let deadline = self.deadline;
            tokio::select! {
                event = events.recv() => match event {
                    Some(UiEvent::Quit) | None => break,
                    Some(event) => self.handle_event(event),
                },
                Some(change) = self.store_changes.recv() => self.on_store_change(&change),
                () = wait_for(deadline) => {
                    debug!("Debounce elapsed");
                    self.refresh_preview_now();
                }
            }
        }
        self.close_preview();
        info!("Controller stopped");
        self
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: UiEvent) {
        trace!("Event: {event:?}");
        match event {
            UiEvent::SetField { field, value } => {
                self.form.set_field(field, value);
                self.schedule_preview_refresh();
            }
            UiEvent::EditExperiment {
                number,
                field,
                value,
            } => {
                if let Some(id) = self.block_at(number) {
                    if let Err(e) = self.form.blocks_mut().edit(id, field, value) {
                        self.report_failure("edit", &e);
                    }
                }
            }
            UiEvent::AddBlock { after: None } => {
                self.form.blocks_mut().push();
            }
            UiEvent::AddBlock {
                after: Some(number),
            } => {
                if let Some(id) = self.block_at(number) {
                    if let Err(e) = self.form.blocks_mut().add_after(id) {
                        self.report_failure("add", &e);
                    }
                }
            }
            UiEvent::ClearBlock(number) => {
                if let Some(id) = self.block_at(number) {
                    match self.form.blocks_mut().remove(id) {
                        Ok(RemoveOutcome::Removed) => debug!("Removed experiment {number}"),
                        Ok(RemoveOutcome::Cleared) => debug!("Cleared last experiment"),
                        Err(e) => self.report_failure("clear", &e),
                    }
                }
            }
            UiEvent::Preview => self.refresh_preview_now(),
            UiEvent::Download(format) => {
                self.download(format);
            }
            UiEvent::ClosePreview | UiEvent::Quit => self.close_preview(),
            UiEvent::Reload(snapshot) => {
                self.form.load(snapshot);
                self.schedule_preview_refresh();
            }
            UiEvent::List => {
                let listing = self.listing();
                self.notify(Notice::Listing(listing));
            }
        }
    }

    /// Arm the debounce deadline if the preview is open.
    ///
    /// A pending deadline is replaced, not queued behind.
    pub fn schedule_preview_refresh(&mut self) {
        if !self.preview.is_open() {
            return;
        }
        self.deadline = Some(Instant::now() + self.options.debounce);
        trace!("Preview refresh in {:?}", self.options.debounce);
    }

    /// Validate, render the PDF and show it, opening the preview if needed.
    pub fn refresh_preview_now(&mut self) {
        self.deadline = None;
        let Some(snapshot) = self.validate() else {
            return;
        };

        let document = match self.renderers.get(DocumentFormat::Pdf).render(&snapshot) {
            Ok(document) => document,
            Err(e) => {
                self.report_failure("preview render", &e);
                return;
            }
        };

        let pages = document.page_count().unwrap_or(1);
        let handle = self.registry.publish(document);
        match self.preview.show(handle) {
            Ok(()) => self.notify(Notice::PreviewUpdated { pages }),
            Err(e) => self.report_failure("preview", &e),
        }
    }

    /// Validate, render as `format` and save to the output directory.
    ///
    /// Returns the written path, or `None` after reporting why not.
    pub fn download(&mut self, format: DocumentFormat) -> Option<PathBuf> {
        let snapshot = self.validate()?;

        let document = match self.renderers.get(format).render(&snapshot) {
            Ok(document) => document,
            Err(e) => {
                self.report_failure("render", &e);
                return None;
            }
        };

        let handle = self.registry.publish(document);
        let file_name = download_filename(&snapshot.course_title, format);
        let saved = save_document(&self.options.output_dir, &file_name, handle.document());
        handle.revoke();

        match saved {
            Ok(path) => {
                self.notify(Notice::Saved {
                    path: path.clone(),
                    format,
                });
                Some(path)
            }
            Err(e) => {
                self.report_failure("download", &e);
                None
            }
        }
    }

    /// Close the preview and drop any pending refresh.
    pub fn close_preview(&mut self) {
        self.deadline = None;
        if !self.preview.is_open() {
            return;
        }
        match self.preview.close() {
            Ok(()) => self.notify(Notice::PreviewClosed),
            Err(e) => self.report_failure("close preview", &e),
        }
    }

    fn on_store_change(&mut self, change: &StoreChange) {
        trace!("Store change: {change:?}");
        if !matches!(change, StoreChange::Edited(..)) {
            let label = self.form.blocks().count_label();
            self.notify(Notice::BlocksChanged(label));
        }
        self.schedule_preview_refresh();
    }

    /// Run the content check and keep the status line in step with it.
    fn validate(&mut self) -> Option<FormSnapshot> {
        match self.form.ensure_content() {
            Ok(snapshot) => {
                if self.status.take().is_some() {
                    self.notify(Notice::ErrorCleared);
                }
                Some(snapshot)
            }
            Err(e) => {
                let message = e.to_string();
                debug!("Validation failed: {message}");
                self.status = Some(message.clone());
                self.notify(Notice::Error(message));
                None
            }
        }
    }

    fn block_at(&self, number: usize) -> Option<BlockId> {
        let id = number
            .checked_sub(1)
            .and_then(|index| self.form.blocks().id_at(index));
        if id.is_none() {
            let e = Error::UnknownBlock { number };
            debug!("{e}");
            self.notify(Notice::Error(e.to_string()));
        }
        id
    }

    fn listing(&self) -> String {
        let snapshot = self.form.snapshot();
        let mut out = String::new();
        for field in FormField::ALL {
            let _ = writeln!(out, "{field}: {}", or_dash(snapshot.get(field)));
        }
        let _ = write!(out, "{}", self.form.blocks().count_label());
        for (index, exp) in snapshot.experiments.iter().enumerate() {
            let _ = write!(
                out,
                "\n  {}. {} | {} | {} | marks {}",
                index + 1,
                or_dash(&exp.date),
                or_dash(&exp.title),
                or_dash(&exp.link),
                or_dash(&exp.marks)
            );
        }
        out
    }

    fn report_failure(&self, action: &str, err: &Error) {
        error!("{action} failed: {err}");
        self.notify(Notice::Error(err.to_string()));
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            trace!("Notice dropped: no front-end listening");
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
