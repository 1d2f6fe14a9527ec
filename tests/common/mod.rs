#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, Timelike};
use pm25_station::config::{DataConfig, TrainingConfig};
use pm25_station::{HourlyFrame, StationLoader};

pub const HOURS: usize = 24 * 30;

/// Writes an export in the station's layout: a metadata row, a header row,
/// midnight written as 24:00 of the previous day, plus a few bad rows.
pub fn write_export(dir: &Path) -> PathBuf {
    let start = NaiveDate::from_ymd_opt(2023, 5, 1)
        .unwrap()
        .and_hms_opt(1, 0, 0)
        .unwrap();

    let mut csv = String::from("Station export,,,,,\nDate,Time,Temperature,Wind Speed,PM2.5,Humidity\n");
    for i in 0..HOURS {
        let t = start + Duration::hours(i as i64);
        let (date, time) = if t.hour() == 0 {
            ((t - Duration::days(1)).date(), "24:00".to_string())
        } else {
            (t.date(), t.format("%H:%M").to_string())
        };
        let phase = i as f64 * std::f64::consts::TAU / 24.0;
        let pm25 = 12.0 + 5.0 * phase.sin() + (i % 7) as f64 * 0.3;
        let temp = 16.0 + 4.0 * (phase - 1.0).sin();
        let wind = 2.5 + (i % 5) as f64 * 0.2;
        writeln!(
            csv,
            "{},{time},{temp:.1},{wind:.1},{pm25:.2},{:.0}",
            date.format("%d/%m/%Y"),
            60.0 + (i % 10) as f64
        )
        .unwrap();
        if i == 100 {
            csv.push_str("Date,Time,Temperature,Wind Speed,PM2.5,Humidity\n");
            csv.push_str("05/05/2023,05:30,15.0,2.0,-3.0,60\n");
        }
    }

    let path = dir.join("station.csv");
    fs::write(&path, csv).unwrap();
    path
}

pub fn small_training() -> TrainingConfig {
    TrainingConfig {
        lstm_units: 8,
        epochs: 3,
        batch_size: 64,
        learning_rate: 0.01,
        ..TrainingConfig::default()
    }
}

pub fn load_export(dir: &Path) -> HourlyFrame {
    let path = write_export(dir);
    let (frame, _) = StationLoader::new(&path, DataConfig::default())
        .load_and_clean()
        .unwrap();
    frame
}
