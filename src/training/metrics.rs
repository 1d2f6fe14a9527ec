use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mae: f64,
    pub rmse: f64,
}

pub fn mean_absolute_error(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    (&actual - &predicted).mapv(f64::abs).mean().unwrap_or(f64::NAN)
}

pub fn root_mean_squared_error(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    (&actual - &predicted)
        .mapv(|e| e * e)
        .mean()
        .map_or(f64::NAN, f64::sqrt)
}

pub fn evaluate(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Evaluation {
    Evaluation {
        mae: mean_absolute_error(actual, predicted),
        rmse: root_mean_squared_error(actual, predicted),
    }
}
