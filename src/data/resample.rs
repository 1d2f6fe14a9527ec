//! Calendar resampling and row-based rolling windows.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    /// Bins labelled by the first day of each month
    MonthStart,
}

impl Frequency {
    fn floor(self, timestamp: NaiveDateTime) -> NaiveDate {
        let date = timestamp.date();
        match self {
            Frequency::Daily => date,
            Frequency::MonthStart => date.with_day(1).unwrap_or(date),
        }
    }

    fn next(self, period: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => period.checked_add_days(Days::new(1)),
            Frequency::MonthStart => period.checked_add_months(Months::new(1)),
        }
    }
}

/// One resampled period; `mean` is `None` when no reading fell inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub period: NaiveDate,
    pub mean: Option<f64>,
}

/// Mean of `values` per calendar period, with every period between the first
/// and last timestamp present.
pub fn resample_mean(timestamps: &[NaiveDateTime], values: &[f64], freq: Frequency) -> Vec<Bin> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (&t, &v) in timestamps.iter().zip(values) {
        if v.is_nan() {
            continue;
        }
        let entry = sums.entry(freq.floor(t)).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    let (Some(first), Some(last)) = (
        timestamps.iter().min().map(|&t| freq.floor(t)),
        timestamps.iter().max().map(|&t| freq.floor(t)),
    ) else {
        return Vec::new();
    };

    let mut bins = Vec::new();
    let mut period = Some(first);
    while let Some(p) = period.filter(|p| *p <= last) {
        let mean = sums.get(&p).map(|&(sum, count)| sum / count as f64);
        bins.push(Bin { period: p, mean });
        period = freq.next(p);
    }
    bins
}

/// Trailing mean over the last `window` rows (current row included). Emits
/// `None` until at least `min_periods` non-missing values are in the window.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let min_periods = min_periods.max(1);
    let mut out = Vec::with_capacity(values.len());
    let (mut sum, mut count) = (0.0, 0usize);

    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
        if i >= window {
            let leaving = values[i - window];
            if !leaving.is_nan() {
                sum -= leaving;
                count -= 1;
            }
        }
        out.push((count >= min_periods).then(|| sum / count as f64));
    }
    out
}

/// Value of the previous row, NaN for the first.
pub fn lag(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i >= periods { values[i - periods] } else { f64::NAN })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 30)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
    }

    #[test]
    fn daily_bins_cover_gaps() {
        let t0 = start();
        let timestamps = vec![t0, t0 + Duration::hours(1), t0 + Duration::hours(50)];
        let values = vec![2.0, 4.0, 9.0];

        let bins = resample_mean(&timestamps, &values, Frequency::Daily);
        // the last reading lands on 2 February at midnight
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].period, NaiveDate::from_ymd_opt(2023, 1, 30).unwrap());
        assert_eq!(bins[0].mean, Some(3.0));
        assert_eq!(bins[1].mean, None);
        assert_eq!(bins[2].mean, None);
        assert_eq!(bins[3].period, NaiveDate::from_ymd_opt(2023, 2, 2).unwrap());
        assert_eq!(bins[3].mean, Some(9.0));
    }

    #[test]
    fn month_start_bins_skip_missing_values() {
        let t0 = start();
        let timestamps = vec![t0, t0 + Duration::hours(3), t0 + Duration::days(40)];
        let values = vec![1.0, f64::NAN, 5.0];

        let bins = resample_mean(&timestamps, &values, Frequency::MonthStart);
        let periods: Vec<_> = bins.iter().map(|b| b.period.month()).collect();
        assert_eq!(periods, vec![1, 2, 3]);
        assert_eq!(bins[0].mean, Some(1.0));
        assert_eq!(bins[1].mean, None);
        assert_eq!(bins[2].mean, Some(5.0));
    }

    #[test]
    fn resample_of_nothing_is_empty() {
        assert!(resample_mean(&[], &[], Frequency::Daily).is_empty());
    }

    #[test]
    fn rolling_mean_respects_min_periods() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(
            rolling_mean(&values, 2, 1),
            vec![Some(1.0), Some(1.5), Some(2.5), Some(3.5)]
        );
        assert_eq!(
            rolling_mean(&values, 3, 3),
            vec![None, None, Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn rolling_mean_ignores_missing_inside_window() {
        let values = [2.0, f64::NAN, 4.0, 6.0];
        assert_eq!(
            rolling_mean(&values, 2, 1),
            vec![Some(2.0), Some(2.0), Some(4.0), Some(5.0)]
        );
    }

    #[test]
    fn lag_shifts_by_rows() {
        let lagged = lag(&[1.0, 2.0, 3.0], 1);
        assert!(lagged[0].is_nan());
        assert_eq!(&lagged[1..], &[1.0, 2.0]);
    }
}
