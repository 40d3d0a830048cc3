//! `labrecord` - Lab-record document generator
//!
//! This library turns course and experiment metadata into a printable lab
//! record: a paginated PDF with per-experiment QR codes, or a flowing DOCX.
//! It also drives a live preview that re-renders after edits.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod form;
pub mod logging;
pub mod model;
pub mod preview;
pub mod render;
pub mod sources;

pub use config::Config;
pub use controller::{Controller, ControllerOptions, Notice, UiEvent};
pub use error::{Error, Result};
pub use form::Form;
pub use logging::init_logging;
pub use model::{ExperimentRecord, FormSnapshot};
pub use render::{DocumentFormat, DocumentRenderer, RenderedDocument, Renderers};
