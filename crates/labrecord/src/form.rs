//! Form aggregation and the one validation rule.
//!
//! [`Form`] is the single read source for rendering: edits from the shell or
//! a reloaded form file are pushed into it, and renderers only ever see the
//! trimmed [`FormSnapshot`] it produces.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{ExperimentBlockStore, FormField, FormSnapshot};

/// Live form state: top-level fields plus experiment blocks.
#[derive(Debug, Default)]
pub struct Form {
    course_title: String,
    student_name: String,
    register_number: String,
    confirm_date: String,
    blocks: ExperimentBlockStore,
}

impl Form {
    /// Create an empty form with one empty experiment block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a form pre-filled from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: FormSnapshot) -> Self {
        let mut form = Self::new();
        form.load(snapshot);
        form
    }

    /// Overwrite every field and block with the contents of `snapshot`.
    ///
    /// The block store observer fires once with `StoreChange::Replaced`.
    pub fn load(&mut self, snapshot: FormSnapshot) {
        self.course_title = snapshot.course_title;
        self.student_name = snapshot.student_name;
        self.register_number = snapshot.register_number;
        self.confirm_date = snapshot.confirm_date;
        self.blocks.replace_all(snapshot.experiments);
    }

    /// Set one top-level field.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::CourseTitle => &mut self.course_title,
            FormField::StudentName => &mut self.student_name,
            FormField::RegisterNumber => &mut self.register_number,
            FormField::ConfirmDate => &mut self.confirm_date,
        };
        *slot = value.into();
    }

    /// Untrimmed value of a top-level field.
    #[must_use]
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::CourseTitle => &self.course_title,
            FormField::StudentName => &self.student_name,
            FormField::RegisterNumber => &self.register_number,
            FormField::ConfirmDate => &self.confirm_date,
        }
    }

    /// The experiment blocks.
    #[must_use]
    pub fn blocks(&self) -> &ExperimentBlockStore {
        &self.blocks
    }

    /// The experiment blocks, mutably.
    pub fn blocks_mut(&mut self) -> &mut ExperimentBlockStore {
        &mut self.blocks
    }

    /// Collect the current state, every value trimmed.
    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            course_title: self.course_title.trim().to_string(),
            student_name: self.student_name.trim().to_string(),
            register_number: self.register_number.trim().to_string(),
            confirm_date: self.confirm_date.trim().to_string(),
            experiments: self.blocks.read(),
        }
    }

    /// True if anything at all has been entered.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.snapshot().has_content()
    }

    /// Snapshot the form, refusing if it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] when [`Form::has_content`] is false.
    pub fn ensure_content(&self) -> Result<FormSnapshot> {
        let snapshot = self.snapshot();
        if snapshot.has_content() {
            Ok(snapshot)
        } else {
            Err(Error::NoContent)
        }
    }
}

/// Read a form file.
///
/// `.json` files are parsed with `serde_json`; anything else is read as TOML.
///
/// # Errors
///
/// Returns [`Error::FormLoad`] if the file is missing or malformed.
pub fn load_form_file(path: &Path) -> Result<FormSnapshot> {
    let bytes = std::fs::read(path).map_err(|e| Error::form_load(path, e.to_string()))?;
    parse_form(path, &bytes)
}

/// Parse form-file bytes, picking the format from `path`'s extension.
///
/// # Errors
///
/// Returns [`Error::FormLoad`] if the bytes do not describe a form.
pub fn parse_form(path: &Path, bytes: &[u8]) -> Result<FormSnapshot> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let snapshot = if is_json {
        serde_json::from_slice(bytes).map_err(|e| Error::form_load(path, e.to_string()))?
    } else {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::form_load(path, e.to_string()))?;
        Figment::from(Toml::string(text))
            .extract::<FormSnapshot>()
            .map_err(|e| Error::form_load(path, e.to_string()))?
    };

    debug!(
        "Loaded form {} with {} experiment(s)",
        path.display(),
        snapshot.experiments.len()
    );
    Ok(snapshot)
}

/// A blank form file with `experiments` empty blocks, dated `today`.
#[must_use]
pub fn form_template(experiments: usize, today: NaiveDate) -> String {
    let mut out = String::from(
        "# Lab record form. Render with `labrec render <file>`.\n\
         # Dates are YYYY-MM-DD; they print as DD-MM-YYYY in the PDF.\n\n",
    );
    out.push_str("course_title = \"\"\nstudent_name = \"\"\nregister_number = \"\"\n");
    let _ = writeln!(out, "confirm_date = \"{}\"", today.format("%Y-%m-%d"));
    for _ in 0..experiments {
        out.push_str("\n[[experiments]]\ndate = \"\"\ntitle = \"\"\nlink = \"\"\nmarks = \"\"\n");
    }
    out
}
