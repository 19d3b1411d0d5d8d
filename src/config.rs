// Configuration for docsweep batch runs
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{DocsweepError, Result};

// Defaults
pub const DEFAULT_INPUT_DIR: &str = "Data_Folder";
pub const DEFAULT_OUTPUT_DIR: &str = "Processed_Data";
pub const DEFAULT_OUTPUT_FILE: &str = "processed_data.json";
pub const DEFAULT_LOG_FILE_NAME: &str = "processing.log";

/// Worker count when nothing else is configured.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub max_in_flight: usize,
    pub file_timeout: Option<Duration>,
    /// `None` disables the log file entirely.
    pub log_file: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            log_file: Some(output_dir.join(DEFAULT_LOG_FILE_NAME)),
            output_dir,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            max_in_flight: default_parallelism(),
            file_timeout: None,
        }
    }
}

/// Keys accepted in a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_file: Option<String>,
    pub max_in_flight: Option<usize>,
    pub file_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub log_to_file: Option<bool>,
}

impl FileConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| DocsweepError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DocsweepError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }
}

/// Overrides coming from the command line (or its env fallbacks).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_file: Option<String>,
    pub max_in_flight: Option<usize>,
    pub file_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub no_log_file: bool,
}

impl BatchConfig {
    /// Layer defaults, then the TOML file, then CLI/env overrides.
    pub fn resolve(file: Option<FileConfig>, overrides: Overrides) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = BatchConfig::default();

        let output_dir = overrides
            .output_dir
            .or(file.output_dir)
            .unwrap_or(defaults.output_dir);

        let log_enabled = !overrides.no_log_file && file.log_to_file.unwrap_or(true);
        let log_file = if log_enabled {
            Some(
                overrides
                    .log_file
                    .or(file.log_file)
                    .unwrap_or_else(|| output_dir.join(DEFAULT_LOG_FILE_NAME)),
            )
        } else {
            None
        };

        let config = BatchConfig {
            input_dir: overrides
                .input_dir
                .or(file.input_dir)
                .unwrap_or(defaults.input_dir),
            output_file: overrides
                .output_file
                .or(file.output_file)
                .unwrap_or(defaults.output_file),
            max_in_flight: overrides
                .max_in_flight
                .or(file.max_in_flight)
                .unwrap_or(defaults.max_in_flight),
            file_timeout: overrides
                .file_timeout_secs
                .or(file.file_timeout_secs)
                .map(Duration::from_secs),
            output_dir,
            log_file,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            return Err(DocsweepError::Config(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.output_file.trim().is_empty() {
            return Err(DocsweepError::Config("output_file must not be empty".to_string()));
        }
        if self.file_timeout == Some(Duration::ZERO) {
            return Err(DocsweepError::Config(
                "file timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}
