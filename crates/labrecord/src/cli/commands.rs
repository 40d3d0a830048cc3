//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::render::DocumentFormat;

/// Render command arguments.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Form file (TOML, or JSON by extension)
    pub form: PathBuf,

    /// Document format [default: from config]
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Write to this exact file instead of the derived name
    #[arg(short, long, value_name = "FILE", conflicts_with = "dir")]
    pub output: Option<PathBuf>,

    /// Directory for the derived file name [default: from config]
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Print a JSON summary
    #[arg(long)]
    pub json: bool,
}

/// Preview command arguments.
#[derive(Debug, Args)]
pub struct PreviewCommand {
    /// Form file to preview
    pub form: PathBuf,

    /// Keep re-rendering when the form file changes (until Ctrl-C)
    #[arg(short, long)]
    pub watch: bool,
}

/// Interactive edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Form file to start from
    pub form: Option<PathBuf>,
}

/// Template command arguments.
#[derive(Debug, Args)]
pub struct NewCommand {
    /// Where to write the template
    #[arg(default_value = "lab-record.toml")]
    pub path: PathBuf,

    /// Number of empty experiments
    #[arg(short = 'n', long, default_value = "6")]
    pub experiments: usize,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// File name command arguments.
#[derive(Debug, Args)]
pub struct FilenameCommand {
    /// Course title, e.g. "CS101 - Intro to Programming"
    pub title: String,

    /// Document format
    #[arg(short, long, value_enum, default_value = "pdf")]
    pub format: FormatArg,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Document format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// PDF, paginated with QR codes
    Pdf,
    /// DOCX, one flowing table
    Docx,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Docx => Self::Docx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_arg_conversion() {
        assert_eq!(DocumentFormat::from(FormatArg::Pdf), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from(FormatArg::Docx), DocumentFormat::Docx);
    }

    #[test]
    fn test_render_command_debug() {
        let cmd = RenderCommand {
            form: PathBuf::from("form.toml"),
            format: Some(FormatArg::Docx),
            output: None,
            dir: None,
            json: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("form.toml"));
        assert!(debug_str.contains("Docx"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
