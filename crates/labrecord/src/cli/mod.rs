//! Command-line interface for labrecord.
//!
//! This module provides the CLI structure for the `labrec` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, EditCommand, FilenameCommand, FormatArg, NewCommand, PreviewCommand,
    RenderCommand,
};

/// labrec - Build lab-record documents
///
/// Turns a course form (title, student details, experiments with optional
/// repository links) into a paginated PDF with QR codes or a DOCX, with a
/// live preview while you edit.
#[derive(Debug, Parser)]
#[command(name = "labrec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a form file to PDF or DOCX
    Render(RenderCommand),

    /// Show a form file in the document viewer
    Preview(PreviewCommand),

    /// Edit a form interactively
    Edit(EditCommand),

    /// Write a blank form template
    New(NewCommand),

    /// Print the download file name for a course title
    Filename(FilenameCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
