use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, NaiveDateTime, Timelike};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::data::datetime::{is_standard_time, repair_datetime, END_OF_DAY};
use crate::data::frame::HourlyFrame;
use crate::data::resample::{lag, rolling_mean};
use crate::data::{
    DAILY_WINDOW, DAY_OF_WEEK, HOUR, HUMIDITY_PCT, PM25_24H_AVG, PM25_LAG_1H, PM25_UGM3, TEMP_C,
    WIND_SPEED_MS,
};
use crate::error::{Error, Result};

/// Header text that reappears inside the data block of some exports
const STRAY_HEADER: &str = "Date";

/// Extensions read as spreadsheets; anything else is read as CSV
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// One data row of the export after positional renaming. Sensor values that
/// failed to parse are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub date: String,
    pub time: String,
    pub temp_c: f64,
    pub wind_speed_ms: f64,
    pub pm25_ugm3: f64,
    pub humidity_pct: f64,
}

/// Row counts for each cleaning step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub stray_headers: usize,
    pub non_standard_times: usize,
    pub end_of_day_rollovers: usize,
    pub invalid_datetimes: usize,
    pub negative_pm25: usize,
    pub missing_pm25: usize,
    pub duplicate_timestamps: usize,
    pub incomplete_rows: usize,
    pub rows_kept: usize,
}

pub struct StationLoader {
    path: PathBuf,
    config: DataConfig,
}

fn parse_number(field: Option<&str>) -> f64 {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn reading_from_record(record: &StringRecord) -> RawReading {
    let text = |i: usize| record.get(i).unwrap_or("").to_string();
    RawReading {
        date: text(0),
        time: text(1),
        temp_c: parse_number(record.get(2)),
        wind_speed_ms: parse_number(record.get(3)),
        pm25_ugm3: parse_number(record.get(4)),
        humidity_pct: parse_number(record.get(5)),
    }
}

impl StationLoader {
    pub fn new(path: impl AsRef<Path>, config: DataConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn load_and_clean(&self) -> Result<(HourlyFrame, CleaningReport)> {
        info!(path = %self.path.display(), "loading station export");
        let (raw, stray_headers) = if is_workbook(&self.path) {
            read_workbook(&self.path, self.config.skip_rows, &self.config.date_format)?
        } else {
            read_raw(File::open(&self.path)?, self.config.skip_rows)?
        };
        let (frame, mut report) = clean(raw, &self.config.date_format)?;
        report.stray_headers = stray_headers;
        report.rows_read += stray_headers;
        Ok((frame, report))
    }
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reads the CSV export: skips `skip_rows` metadata rows and the header row,
/// then renames the first six fields positionally. Returns the readings and
/// the number of stray header rows removed.
pub fn read_raw<R: Read>(reader: R, skip_rows: usize) -> Result<(Vec<RawReading>, usize)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    collect_readings(rdr.records().map(|r| r.map_err(Error::from)), skip_rows)
}

/// Same layout as [`read_raw`], taken from the first worksheet of a workbook.
pub fn read_workbook(path: &Path, skip_rows: usize, date_format: &str) -> Result<(Vec<RawReading>, usize)> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::InvalidInput(format!("{} has no worksheets", path.display())))??;

    let records = range.rows().map(|row| {
        let fields: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(column, cell)| cell_text(cell, column, date_format))
            .collect();
        Ok(StringRecord::from(fields))
    });
    collect_readings(records, skip_rows)
}

/// Renders a cell the way the CSV export spells it. Date cells use
/// `date_format`, time cells `HH:MM`, and a whole day in the time column
/// is the export's `24:00`.
fn cell_text(cell: &Data, column: usize, date_format: &str) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::DateTime(dt) if column == 1 && dt.as_f64() == 1.0 => END_OF_DAY.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(t) if column == 0 => t.format(date_format).to_string(),
            Some(t) => t.format("%H:%M").to_string(),
            None => String::new(),
        },
        _ => String::new(),
    }
}

fn collect_readings<I>(records: I, skip_rows: usize) -> Result<(Vec<RawReading>, usize)>
where
    I: Iterator<Item = Result<StringRecord>>,
{
    let mut readings = Vec::new();
    let mut stray_headers = 0;

    for (index, result) in records.enumerate() {
        let record = result?;
        if index <= skip_rows {
            debug!(row = index, "skipping preamble row");
            continue;
        }
        if record.get(0) == Some(STRAY_HEADER) {
            stray_headers += 1;
            continue;
        }
        readings.push(reading_from_record(&record));
    }

    Ok((readings, stray_headers))
}

/// Turns raw readings into a strictly increasing hourly frame with the
/// derived model features.
pub fn clean(raw: Vec<RawReading>, date_format: &str) -> Result<(HourlyFrame, CleaningReport)> {
    let mut report = CleaningReport {
        rows_read: raw.len(),
        ..Default::default()
    };

    report.non_standard_times = raw.iter().filter(|r| !is_standard_time(&r.time)).count();
    if report.non_standard_times > 0 {
        warn!(
            count = report.non_standard_times,
            "rows with non-standard time formats"
        );
    }

    let mut rows: Vec<(NaiveDateTime, RawReading)> = Vec::with_capacity(raw.len());
    for reading in raw {
        match repair_datetime(&reading.date, &reading.time, date_format) {
            Some(repaired) => {
                if repaired.rolled_over {
                    report.end_of_day_rollovers += 1;
                }
                rows.push((repaired.timestamp, reading));
            }
            None => report.invalid_datetimes += 1,
        }
    }
    if report.invalid_datetimes > 0 {
        warn!(count = report.invalid_datetimes, "removed rows with invalid datetime");
    }

    report.negative_pm25 = rows.iter().filter(|(_, r)| r.pm25_ugm3 < 0.0).count();
    report.missing_pm25 = rows.iter().filter(|(_, r)| r.pm25_ugm3.is_nan()).count();
    rows.retain(|(_, r)| r.pm25_ugm3 >= 0.0);
    if report.negative_pm25 > 0 {
        warn!(count = report.negative_pm25, "removed rows with negative PM2.5 values");
    }

    rows.sort_by_key(|(t, _)| *t);
    let before = rows.len();
    rows.dedup_by_key(|(t, _)| *t);
    report.duplicate_timestamps = before - rows.len();
    if report.duplicate_timestamps > 0 {
        warn!(count = report.duplicate_timestamps, "dropped duplicate timestamps");
    }

    let frame = with_features(rows)?;
    let complete = frame.drop_missing();
    report.incomplete_rows = frame.len() - complete.len();
    report.rows_kept = complete.len();

    if complete.is_empty() {
        return Err(Error::EmptyData(format!(
            "({} rows read, {} with invalid datetime)",
            report.rows_read, report.invalid_datetimes
        )));
    }

    info!(
        rows = report.rows_kept,
        rollovers = report.end_of_day_rollovers,
        incomplete = report.incomplete_rows,
        "cleaned station data"
    );
    Ok((complete, report))
}

fn with_features(rows: Vec<(NaiveDateTime, RawReading)>) -> Result<HourlyFrame> {
    let timestamps: Vec<NaiveDateTime> = rows.iter().map(|(t, _)| *t).collect();
    let column = |f: fn(&RawReading) -> f64| -> Vec<f64> { rows.iter().map(|(_, r)| f(r)).collect() };

    let pm25 = column(|r| r.pm25_ugm3);
    let hour = timestamps.iter().map(|t| t.hour() as f64).collect();
    let day_of_week = timestamps
        .iter()
        .map(|t| t.weekday().num_days_from_monday() as f64)
        .collect();
    let lag_1h = lag(&pm25, 1);
    let avg_24h = rolling_mean(&pm25, DAILY_WINDOW, 1)
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    let mut frame = HourlyFrame::new(timestamps);
    frame.push_column(TEMP_C, column(|r| r.temp_c))?;
    frame.push_column(WIND_SPEED_MS, column(|r| r.wind_speed_ms))?;
    frame.push_column(PM25_UGM3, pm25)?;
    frame.push_column(HUMIDITY_PCT, column(|r| r.humidity_pct))?;
    frame.push_column(HOUR, hour)?;
    frame.push_column(DAY_OF_WEEK, day_of_week)?;
    frame.push_column(PM25_LAG_1H, lag_1h)?;
    frame.push_column(PM25_24H_AVG, avg_24h)?;
    Ok(frame)
}
