use std::path::Path;

use chrono::NaiveDateTime;
use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::data::{HourlyFrame, StandardScaler, FEATURE_COLUMNS, TARGET_COLUMN};
use crate::error::{Error, Result};
use crate::model::network::to_sequences;
use crate::model::{Adam, LstmNetwork, RidgeRegression};
use crate::training::history::TrainingHistory;
use crate::training::metrics::{evaluate, Evaluation};
use crate::utils::io::{save_model, ModelFiles};

/// Scaled features split chronologically into train and test rows
pub struct PreparedData {
    pub scaler: StandardScaler,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub test_timestamps: Vec<NaiveDateTime>,
}

pub struct TrainingOutcome {
    pub scaler: StandardScaler,
    pub linear: RidgeRegression,
    pub lstm: LstmNetwork,
    pub history: TrainingHistory,
    pub linear_eval: Evaluation,
    pub lstm_eval: Evaluation,
    pub test_timestamps: Vec<NaiveDateTime>,
    pub y_test: Array1<f64>,
    pub linear_predictions: Array1<f64>,
    /// Starts at test row `sequence_length - 1`
    pub lstm_predictions: Array1<f64>,
}

/// Fits the scaler on every feature row, then keeps the first
/// `floor(n * (1 - test_size))` rows for training. Rows are never shuffled.
pub fn prepare_data(frame: &HourlyFrame, test_size: f64) -> Result<PreparedData> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(Error::InvalidInput(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    let x = frame.select(&FEATURE_COLUMNS)?;
    let y = Array1::from(frame.column(TARGET_COLUMN)?.to_vec());

    let (scaler, x_scaled) = StandardScaler::fit_transform(&x)?;

    let n = x_scaled.nrows();
    let split = (n as f64 * (1.0 - test_size)).floor() as usize;
    if split == 0 || split >= n {
        return Err(Error::InsufficientData(format!(
            "{n} rows cannot be split with test_size {test_size}"
        )));
    }

    Ok(PreparedData {
        scaler,
        x_train: x_scaled.slice(s![..split, ..]).to_owned(),
        x_test: x_scaled.slice(s![split.., ..]).to_owned(),
        y_train: y.slice(s![..split]).to_owned(),
        y_test: y.slice(s![split..]).to_owned(),
        test_timestamps: frame.timestamps()[split..].to_vec(),
    })
}

pub fn train_linear_model(x_train: &Array2<f64>, y_train: &Array1<f64>, alpha: f64) -> Result<RidgeRegression> {
    let model = RidgeRegression::fit(x_train, y_train, alpha)?;
    info!(
        alpha,
        intercept = model.intercept,
        coefficients = ?model.coefficients.to_vec(),
        "fitted ridge model"
    );
    Ok(model)
}

pub fn train_lstm_model(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    config: &TrainingConfig,
) -> Result<(LstmNetwork, TrainingHistory)> {
    let steps = config.sequence_length.max(1);
    let sequences = to_sequences(x_train.view(), steps)?;
    let targets = y_train.slice(s![steps - 1..]).to_owned();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut network = LstmNetwork::new(x_train.ncols(), config.lstm_units, steps, &mut rng);
    let mut optimizer = Adam::new(config.learning_rate);
    let mut history = TrainingHistory::default();

    let samples = targets.len();
    let batch_size = config.batch_size.max(1);
    let mut order: Vec<usize> = (0..samples).collect();

    info!(
        samples,
        epochs = config.epochs,
        batch_size,
        units = config.lstm_units,
        "training LSTM"
    );

    for epoch in 1..=config.epochs {
        order.shuffle(&mut rng);
        let mut total = 0.0;
        for batch in order.chunks(batch_size) {
            let xb = sequences.select(Axis(0), batch);
            let yb = targets.select(Axis(0), batch);
            total += network.train_batch(&xb, &yb, &mut optimizer)? * batch.len() as f64;
        }
        let loss = total / samples as f64;
        history.record(epoch, loss);
        debug!(epoch, loss, "epoch finished");
    }

    Ok((network, history))
}

/// Forecasts aligned with rows `sequence_length - 1..` of `x`
pub fn predict_lstm(network: &LstmNetwork, x: &Array2<f64>) -> Result<Array1<f64>> {
    let sequences = to_sequences(x.view(), network.sequence_length)?;
    network.forward(&sequences)
}

/// Trains and evaluates both forecasters on `frame`.
pub fn train_models(frame: &HourlyFrame, config: &TrainingConfig) -> Result<TrainingOutcome> {
    let data = prepare_data(frame, config.test_size)?;
    info!(
        train_rows = data.x_train.nrows(),
        test_rows = data.x_test.nrows(),
        "prepared chronological split"
    );

    let linear = train_linear_model(&data.x_train, &data.y_train, config.ridge_alpha)?;
    let linear_predictions = linear.predict(&data.x_test)?;
    let linear_eval = evaluate(data.y_test.view(), linear_predictions.view());
    info!(mae = linear_eval.mae, rmse = linear_eval.rmse, "linear model evaluated");

    let (lstm, history) = train_lstm_model(&data.x_train, &data.y_train, config)?;
    let lstm_predictions = predict_lstm(&lstm, &data.x_test)?;
    let aligned = data.y_test.slice(s![lstm.sequence_length - 1..]);
    let lstm_eval = evaluate(aligned, lstm_predictions.view());
    info!(mae = lstm_eval.mae, rmse = lstm_eval.rmse, "LSTM model evaluated");

    Ok(TrainingOutcome {
        scaler: data.scaler,
        linear,
        lstm,
        history,
        linear_eval,
        lstm_eval,
        test_timestamps: data.test_timestamps,
        y_test: data.y_test,
        linear_predictions,
        lstm_predictions,
    })
}

/// Persists both models and the scaler under `model_dir`.
pub fn save_models(outcome: &TrainingOutcome, model_dir: &Path) -> Result<ModelFiles> {
    let files = ModelFiles::in_dir(model_dir);
    std::fs::create_dir_all(model_dir)?;
    save_model(&files.linear, &outcome.linear)?;
    save_model(&files.lstm, &outcome.lstm)?;
    save_model(&files.scaler, &outcome.scaler)?;
    info!(dir = %model_dir.display(), "saved models and scaler");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DAY_OF_WEEK, HOUR, PM25_24H_AVG, PM25_LAG_1H, PM25_UGM3, TEMP_C, WIND_SPEED_MS};
    use chrono::{Duration, NaiveDate};

    fn synthetic_frame(n: usize) -> HourlyFrame {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps: Vec<_> = (0..n).map(|i| start + Duration::hours(i as i64)).collect();
        let wave = |i: usize| (i as f64 * std::f64::consts::TAU / 24.0).sin();
        let pm: Vec<f64> = (0..n).map(|i| 10.0 + 4.0 * wave(i)).collect();

        let mut frame = HourlyFrame::new(timestamps);
        frame.push_column(TEMP_C, (0..n).map(|i| 15.0 + wave(i + 3)).collect()).unwrap();
        frame.push_column(WIND_SPEED_MS, (0..n).map(|i| 2.0 + (i % 5) as f64 * 0.1).collect()).unwrap();
        frame.push_column(PM25_UGM3, pm.clone()).unwrap();
        frame.push_column(HOUR, (0..n).map(|i| (i % 24) as f64).collect()).unwrap();
        frame.push_column(DAY_OF_WEEK, (0..n).map(|i| ((i / 24 + 2) % 7) as f64).collect()).unwrap();
        frame
            .push_column(PM25_LAG_1H, (0..n).map(|i| if i == 0 { pm[0] } else { pm[i - 1] }).collect())
            .unwrap();
        frame.push_column(PM25_24H_AVG, vec![10.0; n]).unwrap();
        frame
    }

    #[test]
    fn split_is_chronological() {
        let frame = synthetic_frame(10);
        let data = prepare_data(&frame, 0.2).unwrap();
        assert_eq!(data.x_train.dim(), (8, 6));
        assert_eq!(data.x_test.dim(), (2, 6));
        assert_eq!(data.test_timestamps, frame.timestamps()[8..].to_vec());
        assert_eq!(data.y_test.to_vec(), frame.column(PM25_UGM3).unwrap()[8..].to_vec());
    }

    #[test]
    fn degenerate_splits_are_rejected() {
        // floor(1 * 0.8) leaves nothing to train on
        let frame = synthetic_frame(1);
        assert!(matches!(prepare_data(&frame, 0.2), Err(Error::InsufficientData(_))));
        // two rows still split one and one
        assert!(prepare_data(&synthetic_frame(2), 0.2).is_ok());
        assert!(prepare_data(&synthetic_frame(10), 0.0).is_err());
        assert!(prepare_data(&synthetic_frame(10), 1.0).is_err());
    }

    #[test]
    fn both_models_learn_the_lagged_signal() {
        let frame = synthetic_frame(24 * 14);
        let config = TrainingConfig {
            lstm_units: 8,
            epochs: 30,
            batch_size: 16,
            learning_rate: 0.02,
            ..TrainingConfig::default()
        };
        let outcome = train_models(&frame, &config).unwrap();

        // lag and temperature are phase-shifted copies of the target
        assert!(outcome.linear_eval.mae < 0.5, "linear {:?}", outcome.linear_eval);
        // an untrained network predicts ~0 against targets around 10
        assert!(outcome.lstm_eval.mae < 5.0, "lstm {:?}", outcome.lstm_eval);
        assert_eq!(outcome.history.epochs.len(), 30);
        assert!(outcome.history.losses[29] < outcome.history.losses[0]);
        assert_eq!(outcome.linear_predictions.len(), outcome.y_test.len());
        assert_eq!(outcome.lstm_predictions.len(), outcome.y_test.len());
    }

    #[test]
    fn longer_windows_shorten_predictions() {
        let frame = synthetic_frame(100);
        let config = TrainingConfig {
            lstm_units: 4,
            sequence_length: 3,
            epochs: 2,
            ..TrainingConfig::default()
        };
        let outcome = train_models(&frame, &config).unwrap();
        assert_eq!(outcome.lstm.sequence_length, 3);
        assert_eq!(outcome.lstm_predictions.len(), outcome.y_test.len() - 2);
    }
}
