pub mod history;
pub mod metrics;
pub mod trainer;

pub use history::TrainingHistory;
pub use metrics::{evaluate, mean_absolute_error, Evaluation};
pub use trainer::{
    prepare_data, train_linear_model, train_lstm_model, train_models, save_models, PreparedData, TrainingOutcome,
};
