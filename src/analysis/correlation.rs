use crate::data::resample::rolling_mean;
use crate::data::stats::pearson;
use crate::data::HourlyFrame;

/// Pairwise Pearson coefficients; `None` where a column is constant.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        self.values[i][j]
    }
}

/// Correlations between every column of `frame` after smoothing each with a
/// trailing mean of `window` rows (at least one observation). A window of 1
/// correlates the raw readings.
pub fn correlation_matrix(frame: &HourlyFrame, window: usize) -> CorrelationMatrix {
    let names: Vec<String> = frame.column_names().map(str::to_string).collect();
    let smoothed: Vec<Vec<f64>> = names
        .iter()
        .map(|name| {
            let values = frame.column(name).unwrap_or(&[]);
            rolling_mean(values, window, 1)
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    let values = smoothed
        .iter()
        .map(|a| smoothed.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix { names, values }
}
