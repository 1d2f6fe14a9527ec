//! Classical additive seasonal decomposition by moving averages.
//!
//! `observed = trend + seasonal + residual`, where the trend is a centred
//! moving average over one period and the seasonal component is the mean
//! detrended value at each phase, shifted to sum to zero over a period.

use chrono::NaiveDate;
use tracing::info;

use crate::data::resample::{resample_mean, Frequency};
use crate::data::{HourlyFrame, PM25_UGM3, WEEKLY_WINDOW};
use crate::error::{Error, Result};

pub const ANNUAL_PERIOD: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub period: usize,
    pub observed: Vec<f64>,
    /// NaN for the first and last `period / 2` points
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

/// Labels for the points of a decomposition, as x positions for charts
#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionIndex {
    Hourly(Vec<chrono::NaiveDateTime>),
    Monthly(Vec<NaiveDate>),
}

/// Centred moving average; an even period uses the 2×period filter with
/// half weights at both ends.
fn centred_trend(values: &[f64], period: usize) -> Vec<f64> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] /= 2.0;
        w[period] /= 2.0;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    (0..values.len())
        .map(|i| {
            if i < half || i + half >= values.len() {
                return f64::NAN;
            }
            weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[i + k - half])
                .sum()
        })
        .collect()
}

pub fn seasonal_decompose(values: &[f64], period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(Error::InvalidInput(format!("period must be at least 2, got {period}")));
    }
    if values.len() < 2 * period {
        return Err(Error::InsufficientData(format!(
            "{} observations cannot cover two full cycles of period {period}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput("series contains missing values".into()));
    }

    let trend = centred_trend(values, period);
    let detrended: Vec<f64> = values.iter().zip(&trend).map(|(v, t)| v - t).collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let (sum, count) = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 { 0.0 } else { sum / count as f64 }
        })
        .collect();
    let offset = phase_means.iter().sum::<f64>() / period as f64;
    for m in &mut phase_means {
        *m -= offset;
    }

    let seasonal: Vec<f64> = (0..values.len()).map(|i| phase_means[i % period]).collect();
    let residual = detrended.iter().zip(&seasonal).map(|(d, s)| d - s).collect();

    Ok(Decomposition {
        period,
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
    })
}

/// Hourly PM2.5 against a one-week cycle.
pub fn weekly_decomposition(frame: &HourlyFrame) -> Result<(DecompositionIndex, Decomposition)> {
    let pm25 = frame.column(PM25_UGM3)?;
    let (index, values): (Vec<_>, Vec<_>) = frame
        .timestamps()
        .iter()
        .zip(pm25)
        .filter(|(_, v)| !v.is_nan())
        .map(|(&t, &v)| (t, v))
        .unzip();

    let decomposition = seasonal_decompose(&values, WEEKLY_WINDOW)?;
    info!(points = values.len(), "weekly decomposition complete");
    Ok((DecompositionIndex::Hourly(index), decomposition))
}

/// Month-start mean PM2.5 against a twelve-month cycle. Months without
/// readings are dropped.
pub fn annual_decomposition(frame: &HourlyFrame) -> Result<(DecompositionIndex, Decomposition)> {
    let pm25 = frame.column(PM25_UGM3)?;
    let (index, values): (Vec<_>, Vec<_>) =
        resample_mean(frame.timestamps(), pm25, Frequency::MonthStart)
            .into_iter()
            .filter_map(|bin| bin.mean.map(|m| (bin.period, m)))
            .unzip();

    let decomposition = seasonal_decompose(&values, ANNUAL_PERIOD)?;
    info!(months = values.len(), "annual decomposition complete");
    Ok((DecompositionIndex::Monthly(index), decomposition))
}
