use std::fmt;

use chrono::NaiveDateTime;
use ndarray::Array2;

use crate::data::stats;
use crate::error::{Error, Result};

/// Time-indexed table of hourly readings. Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyFrame {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<(String, Vec<f64>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl HourlyFrame {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Appends a column, replacing any existing column of the same name.
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.timestamps.len() {
            return Err(Error::InvalidInput(format!(
                "column {name} has {} values, index has {}",
                values.len(),
                self.timestamps.len()
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Keeps the rows for which `keep` is true.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let pick = |values: &[f64]| -> Vec<f64> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, &k)| k)
                .map(|(&v, _)| v)
                .collect()
        };
        Self {
            timestamps: self
                .timestamps
                .iter()
                .zip(keep)
                .filter(|(_, &k)| k)
                .map(|(&t, _)| t)
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), pick(values)))
                .collect(),
        }
    }

    /// Drops every row with a missing value in any column.
    pub fn drop_missing(&self) -> Self {
        let keep: Vec<bool> = (0..self.len())
            .map(|row| self.columns.iter().all(|(_, values)| !values[row].is_nan()))
            .collect();
        self.filter_rows(&keep)
    }

    /// Rows × `names` matrix, columns in the requested order.
    pub fn select(&self, names: &[&str]) -> Result<Array2<f64>> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.column(name).is_err())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let cols = names
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Array2::from_shape_fn((self.len(), names.len()), |(r, c)| cols[c][r]))
    }

    pub fn describe(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|(name, values)| {
                let sorted = stats::sorted(values);
                ColumnSummary {
                    name: name.clone(),
                    count: sorted.len(),
                    mean: stats::mean(values),
                    std: stats::std_dev(values),
                    min: sorted.first().copied(),
                    q25: stats::quantile_sorted(&sorted, 0.25),
                    median: stats::quantile_sorted(&sorted, 0.5),
                    q75: stats::quantile_sorted(&sorted, 0.75),
                    max: sorted.last().copied(),
                }
            })
            .collect()
    }
}

/// Renders `describe()` as a fixed-width table.
pub struct DescribeTable<'a>(pub &'a [ColumnSummary]);

impl fmt::Display for DescribeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |v: Option<f64>| v.map_or_else(|| "NaN".to_string(), |v| format!("{v:.3}"));
        writeln!(
            f,
            "{:<16}{:>10}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in self.0 {
            writeln!(
                f,
                "{:<16}{:>10}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}",
                s.name,
                s.count,
                cell(s.mean),
                cell(s.std),
                cell(s.min),
                cell(s.q25),
                cell(s.median),
                cell(s.q75),
                cell(s.max)
            )?;
        }
        Ok(())
    }
}
