//! Hourly PM2.5 station pipeline: clean the export, chart and decompose the
//! series, train ridge and LSTM forecasters, and predict from saved models.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod prediction;
pub mod training;
pub mod utils;
pub mod visualization;

pub use config::Config;
pub use data::{CleaningReport, HourlyFrame, StationLoader};
pub use error::{Error, Result};
pub use model::ModelKind;
pub use prediction::{FeatureTable, Predictor};
pub use training::{train_models, TrainingOutcome};
pub use visualization::Visualizer;
