pub mod correlation;
pub mod decomposition;

pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use decomposition::{
    annual_decomposition, seasonal_decompose, weekly_decomposition, Decomposition, DecompositionIndex,
};
