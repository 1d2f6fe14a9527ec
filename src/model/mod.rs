pub mod layers;
pub mod network;
pub mod optimizer;
pub mod ridge;

use std::fmt;

pub use network::LstmNetwork;
pub use optimizer::Adam;
pub use ridge::RidgeRegression;

/// Which persisted forecaster to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    #[value(alias = "ridge")]
    Linear,
    Lstm,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Linear => write!(f, "linear"),
            ModelKind::Lstm => write!(f, "lstm"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn parses_names_and_the_ridge_alias() {
        assert_eq!(ModelKind::from_str("linear", false), Ok(ModelKind::Linear));
        assert_eq!(ModelKind::from_str("ridge", false), Ok(ModelKind::Linear));
        assert_eq!(ModelKind::from_str("LSTM", true), Ok(ModelKind::Lstm));
        assert!(ModelKind::from_str("arima", false).is_err());
        assert_eq!(ModelKind::Lstm.to_string(), "lstm");
    }
}
