mod common;

use std::fs;
use std::path::Path;

use common::{load_export, small_training};
use pm25_station::analysis::{seasonal_decompose, weekly_decomposition, DecompositionIndex};
use pm25_station::visualization::{
    ANNUAL_DECOMPOSITION_FILE, CORRELATION_FILE, MONTHLY_BOXPLOT_FILE, PREDICTIONS_FILE, TIME_SERIES_FILE,
    TRAINING_LOSS_FILE, WEEKLY_DECOMPOSITION_FILE, YEAR_OVER_YEAR_FILE,
};
use pm25_station::{train_models, Visualizer};

fn assert_png(path: &Path, name: &str) {
    assert!(path.ends_with(name), "{} is not {name}", path.display());
    let bytes = fs::read(path).unwrap();
    assert!(bytes.len() > 1024, "{name} is only {} bytes", bytes.len());
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn descriptive_charts_render() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load_export(dir.path());
    // the image directory does not exist yet
    let visualizer = Visualizer::new(dir.path().join("docs/images"));

    assert_png(&visualizer.plot_time_series(&frame).unwrap(), TIME_SERIES_FILE);
    assert_png(&visualizer.plot_correlation_heatmap(&frame).unwrap(), CORRELATION_FILE);
    assert_png(&visualizer.plot_monthly_boxplots(&frame).unwrap(), MONTHLY_BOXPLOT_FILE);
    assert_png(&visualizer.plot_year_over_year(&frame).unwrap(), YEAR_OVER_YEAR_FILE);
}

#[test]
fn decomposition_charts_render() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load_export(dir.path());
    let visualizer = Visualizer::new(dir.path().join("images"));

    let (index, weekly) = weekly_decomposition(&frame).unwrap();
    let path = visualizer
        .plot_decomposition(&index, &weekly, "Weekly", "Weekly Seasonality", WEEKLY_DECOMPOSITION_FILE)
        .unwrap();
    assert_png(&path, WEEKLY_DECOMPOSITION_FILE);

    // two synthetic years of monthly means
    let months: Vec<_> = (0..24)
        .map(|m| chrono::NaiveDate::from_ymd_opt(2022 + m / 12, (m % 12) as u32 + 1, 1).unwrap())
        .collect();
    let values: Vec<f64> = (0..24).map(|m| 10.0 + (m % 12) as f64 + 0.1 * m as f64).collect();
    let annual = seasonal_decompose(&values, 12).unwrap();
    let path = visualizer
        .plot_decomposition(
            &DecompositionIndex::Monthly(months),
            &annual,
            "Annual",
            "Annual Seasonality",
            ANNUAL_DECOMPOSITION_FILE,
        )
        .unwrap();
    assert_png(&path, ANNUAL_DECOMPOSITION_FILE);
}

#[test]
fn model_charts_render() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load_export(dir.path());
    let outcome = train_models(&frame, &small_training()).unwrap();
    let visualizer = Visualizer::new(dir.path());

    assert_png(&visualizer.plot_predictions(&outcome).unwrap(), PREDICTIONS_FILE);
    assert_png(&visualizer.plot_training_history(&outcome).unwrap(), TRAINING_LOSS_FILE);
}
