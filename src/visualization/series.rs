//! Chart inputs derived from the cleaned frame.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::data::resample::rolling_mean;
use crate::error::Result;
use crate::data::{HourlyFrame, PM25_UGM3};

/// PM2.5 readings grouped by calendar month (1 = January)
pub fn monthly_groups(frame: &HourlyFrame) -> Result<BTreeMap<u32, Vec<f64>>> {
    let pm25 = frame.column(PM25_UGM3)?;
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (t, &v) in frame.timestamps().iter().zip(pm25) {
        if !v.is_nan() {
            groups.entry(t.month()).or_default().push(v);
        }
    }
    Ok(groups)
}

/// Fractional day of the year, starting at 1.0 for 1 January 00:00
pub fn day_of_year(t: &NaiveDateTime) -> f64 {
    t.ordinal() as f64 + (t.hour() as f64 + t.minute() as f64 / 60.0) / 24.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearLine {
    pub year: i32,
    pub points: Vec<(f64, Option<f64>)>,
}

/// One line per calendar year of the trailing `window`-row mean, positioned
/// by day of year so the years overlay. The mean needs a full window.
pub fn year_over_year(frame: &HourlyFrame, window: usize) -> Result<Vec<YearLine>> {
    let pm25 = frame.column(PM25_UGM3)?;
    let mut rows_by_year: BTreeMap<i32, (Vec<NaiveDateTime>, Vec<f64>)> = BTreeMap::new();
    for (&t, &v) in frame.timestamps().iter().zip(pm25) {
        let entry = rows_by_year.entry(t.year()).or_default();
        entry.0.push(t);
        entry.1.push(v);
    }

    Ok(rows_by_year
        .into_iter()
        .map(|(year, (timestamps, values))| YearLine {
            year,
            points: timestamps
                .iter()
                .map(day_of_year)
                .zip(rolling_mean(&values, window, window))
                .collect(),
        })
        .collect())
}

/// Days elapsed since `origin`, for positioning dates on an f64 axis
pub fn days_since(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Blue (-1) through white (0) to red (+1)
pub fn coolwarm(value: f64) -> (u8, u8, u8) {
    const BLUE: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const RED: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let v = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
    let (from, to, t) = if v < 0.0 { (MID, BLUE, -v) } else { (MID, RED, v) };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    (mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}
