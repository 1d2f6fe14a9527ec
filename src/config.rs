use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// File picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "pm25-station.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub data: DataConfig,
    pub output: OutputConfig,
    pub training: TrainingConfig,
}

/// How the raw station export is read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Metadata rows preceding the header row
    pub skip_rows: usize,
    /// chrono format of the `date` column
    pub date_format: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            skip_rows: 1,
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub image_dir: PathBuf,
    pub model_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("docs/images"),
            model_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows (taken from the end) held out for evaluation
    pub test_size: f64,
    pub ridge_alpha: f64,
    pub lstm_units: usize,
    pub sequence_length: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            ridge_alpha: 0.1,
            lstm_units: 64,
            sequence_length: 1,
            epochs: 20,
            batch_size: 32,
            learning_rate: 0.001,
            seed: 42,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Explicit path, then `pm25-station.toml` in the working directory, then defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    debug!("no configuration file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.data.skip_rows, 1);
        assert_eq!(config.data.date_format, "%d/%m/%Y");
        assert_eq!(config.training.epochs, 20);
        assert_eq!(config.training.lstm_units, 64);
        assert_eq!(config.output.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            log_level = "debug"

            [training]
            epochs = 5
            ridge_alpha = 1.5

            [output]
            image_dir = "out/charts"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.training.ridge_alpha, 1.5);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.output.image_dir, PathBuf::from("out/charts"));
        assert_eq!(config.output.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(Config::from_toml_str("[training\nepochs = 5").is_err());
    }
}
