use std::path::Path;

use tracing::info;

use crate::data::{StandardScaler, FEATURE_COLUMNS};
use crate::error::{Error, Result};
use crate::model::network::to_sequences;
use crate::model::{LstmNetwork, ModelKind, RidgeRegression};
use crate::prediction::features::FeatureTable;
use crate::utils::io::{load_model, ModelFiles};

/// Persisted forecasters together with the scaler they were trained behind.
pub struct Predictor {
    linear: RidgeRegression,
    lstm: LstmNetwork,
    scaler: StandardScaler,
}

impl Predictor {
    pub fn new(linear: RidgeRegression, lstm: LstmNetwork, scaler: StandardScaler) -> Self {
        Self {
            linear,
            lstm,
            scaler,
        }
    }

    /// Loads all three files; fails on the first that is missing.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let files = ModelFiles::in_dir(model_dir);
        let linear = load_model(&files.linear)?;
        let lstm = load_model(&files.lstm)?;
        let scaler = load_model(&files.scaler)?;
        info!(dir = %model_dir.display(), "loaded models and scaler");
        Ok(Self::new(linear, lstm, scaler))
    }

    /// Rows of input the LSTM needs before its first forecast
    pub fn lstm_window(&self) -> usize {
        self.lstm.sequence_length
    }

    /// One forecast per row for the linear model, one per window of
    /// `lstm_window()` consecutive rows for the LSTM.
    pub fn predict(&self, table: &FeatureTable, kind: ModelKind) -> Result<Vec<f64>> {
        let raw = table.to_matrix(&FEATURE_COLUMNS)?;
        if raw.nrows() == 0 {
            return Err(Error::InvalidInput("no rows to predict".into()));
        }
        let x = self.scaler.transform(&raw)?;

        let predictions = match kind {
            ModelKind::Linear => self.linear.predict(&x)?,
            ModelKind::Lstm => {
                let sequences = to_sequences(x.view(), self.lstm.sequence_length)?;
                self.lstm.forward(&sequences)?
            }
        };
        Ok(predictions.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn predictor() -> Predictor {
        let x = Array2::from_shape_fn((8, 6), |(r, c)| (r * (c + 1)) as f64 + c as f64);
        let scaler = StandardScaler::fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();
        let y = Array1::from_iter((0..8).map(|r| 5.0 + r as f64));
        let linear = RidgeRegression::fit(&scaled, &y, 0.1).unwrap();
        let lstm = LstmNetwork::new(6, 4, 1, &mut StdRng::seed_from_u64(5));
        Predictor::new(linear, lstm, scaler)
    }

    fn table(rows: usize) -> FeatureTable {
        FeatureTable::from_columns(
            FEATURE_COLUMNS
                .iter()
                .enumerate()
                .map(|(c, name)| (name.to_string(), (0..rows).map(|r| (r + c) as f64).collect()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn one_forecast_per_row_for_both_models() {
        let predictor = predictor();
        let input = table(3);
        assert_eq!(predictor.predict(&input, ModelKind::Linear).unwrap().len(), 3);
        let lstm = predictor.predict(&input, ModelKind::Lstm).unwrap();
        assert_eq!(lstm.len(), 3);
        assert!(lstm.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn incomplete_input_is_rejected_with_names() {
        let predictor = predictor();
        let input = FeatureTable::from_columns(vec![("hour".into(), vec![1.0])]).unwrap();
        match predictor.predict(&input, ModelKind::Linear) {
            Err(Error::MissingColumns(cols)) => {
                assert_eq!(cols.len(), 5);
                assert!(cols.contains(&"pm25_lag1h".to_string()));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn extra_columns_are_ignored() {
        let predictor = predictor();
        let mut columns = vec![("humidity_pct".to_string(), vec![80.0, 81.0])];
        for (c, name) in FEATURE_COLUMNS.iter().enumerate() {
            columns.push((name.to_string(), vec![c as f64, c as f64 + 1.0]));
        }
        let input = FeatureTable::from_columns(columns).unwrap();
        assert_eq!(predictor.predict(&input, ModelKind::Linear).unwrap().len(), 2);
    }

    #[test]
    fn loading_without_training_points_at_the_file() {
        let dir = tempfile::tempdir().unwrap();
        match Predictor::load(dir.path()) {
            Err(Error::ModelNotFound(path)) => assert!(path.ends_with("linear_pm25.bin")),
            Err(other) => panic!("unexpected: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
