//! Configuration management for labrecord.
//!
//! Configuration is layered with figment: built-in defaults, then the TOML
//! config file, then `LABREC_`-prefixed environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render::DocumentFormat;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "labrecord";

/// Stem of the preview file inside the data directory.
const PREVIEW_FILE_STEM: &str = "preview";

/// Statement printed above the student details.
pub const DEFAULT_CONFIRMATION_STATEMENT: &str =
    "I confirm that the experiments and GitHub links provided are entirely my own work.";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LABREC_`)
/// 2. TOML config file at `~/.config/labrecord/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document content configuration.
    pub document: DocumentConfig,
    /// Download/output configuration.
    pub output: OutputConfig,
    /// Live preview configuration.
    pub preview: PreviewConfig,
}

/// What goes into the rendered document besides the form itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Institution logo drawn above the title on the first PDF page.
    pub logo_path: Option<PathBuf>,
    /// Confirmation statement printed before the student details.
    pub confirmation_statement: String,
}

/// Where downloads are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for rendered documents. Defaults to the working directory.
    pub directory: Option<PathBuf>,
    /// Format used when none is given on the command line.
    pub default_format: DocumentFormat,
}

/// Live preview behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Preview file path.
    /// Defaults to `~/.local/share/labrecord/preview.pdf`
    pub path: Option<PathBuf>,
    /// Quiet period after the last edit before the preview re-renders.
    pub debounce_ms: u64,
    /// How often a watched form file is checked for changes.
    pub poll_interval_ms: u64,
    /// Open the platform viewer when the preview opens.
    pub launch_viewer: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            logo_path: None,
            confirmation_statement: DEFAULT_CONFIRMATION_STATEMENT.to_string(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            path: None,
            debounce_ms: 600,
            poll_interval_ms: 300,
            launch_viewer: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LABREC_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.preview.debounce_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "debounce_ms must be greater than 0".to_string(),
            });
        }

        if self.preview.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.document.confirmation_statement.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "confirmation_statement must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the preview file path, resolving defaults if not set.
    #[must_use]
    pub fn preview_path(&self) -> PathBuf {
        self.preview.path.clone().unwrap_or_else(|| {
            Self::default_data_dir()
                .join(PREVIEW_FILE_STEM)
                .with_extension(DocumentFormat::Pdf.extension())
        })
    }

    /// Get the output directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the debounce delay as a Duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.preview.debounce_ms)
    }

    /// Get the form-file poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.preview.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.document.logo_path.is_none());
        assert_eq!(
            config.document.confirmation_statement,
            DEFAULT_CONFIRMATION_STATEMENT
        );
        assert_eq!(config.output.default_format, DocumentFormat::Pdf);
        assert!(config.preview.launch_viewer);
    }

    #[test]
    fn test_default_preview_config() {
        let preview = PreviewConfig::default();

        assert!(preview.path.is_none());
        assert_eq!(preview.debounce_ms, 600);
        assert_eq!(preview.poll_interval_ms, 300);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_debounce() {
        let mut config = Config::default();
        config.preview.debounce_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("debounce_ms"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.preview.poll_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_blank_statement() {
        let mut config = Config::default();
        config.document.confirmation_statement = "   ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("confirmation_statement"));
    }

    #[test]
    fn test_preview_path_default() {
        let config = Config::default();
        let path = config.preview_path();

        assert!(path.to_string_lossy().contains("labrecord"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
    }

    #[test]
    fn test_preview_path_custom() {
        let mut config = Config::default();
        config.preview.path = Some(PathBuf::from("/tmp/lab.pdf"));

        assert_eq!(config.preview_path(), PathBuf::from("/tmp/lab.pdf"));
    }

    #[test]
    fn test_output_dir_default() {
        assert_eq!(Config::default().output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.debounce(), Duration::from_millis(600));
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("labrecord"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[preview]\ndebounce_ms = 250\n\n[output]\ndefault_format = \"docx\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.preview.debounce_ms, 250);
        assert_eq!(config.output.default_format, DocumentFormat::Docx);
        assert_eq!(config.preview.poll_interval_ms, 300);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[preview]\ndebounce_ms = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("debounce_ms"));
        assert!(json.contains("confirmation_statement"));
    }
}
