//! Forecasts from persisted models.

pub mod features;
pub mod predictor;

pub use features::FeatureTable;
pub use predictor::Predictor;
