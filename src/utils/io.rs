use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub const LINEAR_MODEL_FILE: &str = "linear_pm25.bin";
pub const LSTM_MODEL_FILE: &str = "lstm_pm25.bin";
pub const SCALER_FILE: &str = "scaler.bin";

/// Locations of the persisted forecasters and scaler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub linear: PathBuf,
    pub lstm: PathBuf,
    pub scaler: PathBuf,
}

impl ModelFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            linear: dir.join(LINEAR_MODEL_FILE),
            lstm: dir.join(LSTM_MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
        }
    }
}

pub fn save_model<T: Serialize>(path: &Path, model: &T) -> Result<()> {
    let model_data = bincode::serialize(model)?;
    std::fs::write(path, model_data)?;
    Ok(())
}

pub fn load_model<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::ModelNotFound(path.to_path_buf()));
    }
    let model_data = std::fs::read(path)?;
    let model = bincode::deserialize(&model_data)?;
    Ok(model)
}

/// Creates `dir` if needed and returns the path of `file_name` inside it.
pub fn output_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StandardScaler;
    use ndarray::array;

    #[test]
    fn scaler_survives_a_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SCALER_FILE);
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 6.0]]).unwrap();

        save_model(&path, &scaler).unwrap();
        let loaded: StandardScaler = load_model(&path).unwrap();
        assert_eq!(loaded, scaler);
    }

    #[test]
    fn missing_model_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = ModelFiles::in_dir(dir.path());
        match load_model::<StandardScaler>(&files.linear) {
            Err(Error::ModelNotFound(path)) => assert!(path.ends_with(LINEAR_MODEL_FILE)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn output_path_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs").join("images");
        let path = output_path(&nested, "chart.png").unwrap();
        assert!(nested.is_dir());
        assert_eq!(path, nested.join("chart.png"));
    }
}
