use std::io::Read;

use csv::{ReaderBuilder, Trim};
use ndarray::Array2;

use crate::data::HourlyFrame;
use crate::error::{Error, Result};

/// Named numeric columns supplied for prediction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<(String, Vec<f64>)>,
    /// Columns with a cell that did not parse, with the first such cell
    unparsed: Vec<(String, String)>,
    rows: usize,
}

impl FeatureTable {
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let rows = columns.first().map_or(0, |(_, values)| values.len());
        if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != rows) {
            return Err(Error::InvalidInput(format!(
                "column {name} has {} values, expected {rows}",
                values.len()
            )));
        }
        Ok(Self {
            columns,
            unparsed: Vec::new(),
            rows,
        })
    }

    /// Reads a CSV with a header row. Columns holding text (timestamps,
    /// station names) are kept aside and only fail if a model asks for them.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<(String, Vec<f64>)> =
            headers.iter().map(|name| (name.clone(), Vec::new())).collect();
        let mut unparsed: Vec<Option<String>> = vec![None; headers.len()];

        let mut rows = 0;
        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            rows += 1;
            for (c, (name, values)) in columns.iter_mut().enumerate() {
                let field = record.get(c).unwrap_or("");
                match field.parse::<f64>() {
                    Ok(value) => values.push(value),
                    Err(_) => {
                        values.push(f64::NAN);
                        unparsed[c].get_or_insert_with(|| {
                            format!("row {}: {name} value {field:?} is not a number", line + 1)
                        });
                    }
                }
            }
        }

        let mut table = Self::from_columns(Vec::new())?;
        table.rows = rows;
        for ((name, values), problem) in columns.into_iter().zip(unparsed) {
            match problem {
                Some(message) => table.unparsed.push((name, message)),
                None => table.columns.push((name, values)),
            }
        }
        Ok(table)
    }

    /// Every column of a cleaned frame
    pub fn from_frame(frame: &HourlyFrame) -> Result<Self> {
        let columns = frame
            .column_names()
            .map(|name| -> Result<(String, Vec<f64>)> {
                Ok((name.to_string(), frame.column(name)?.to_vec()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_columns(columns)
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column(name).is_none() && self.unparsed_reason(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    fn unparsed_reason(&self, name: &str) -> Option<&str> {
        self.unparsed
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, message)| message.as_str())
    }

    /// Rows × `required` matrix; fails listing every absent column, or on
    /// the first required column that is not numeric.
    pub fn to_matrix(&self, required: &[&str]) -> Result<Array2<f64>> {
        let missing = self.missing_columns(required);
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }
        if let Some(message) = required.iter().find_map(|name| self.unparsed_reason(name)) {
            return Err(Error::InvalidInput(message.to_string()));
        }
        let cols: Vec<&[f64]> = required.iter().filter_map(|name| self.column(name)).collect();
        Ok(Array2::from_shape_fn((self.rows, required.len()), |(r, c)| cols[c][r]))
    }
}
