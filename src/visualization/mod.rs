//! PNG charts of the cleaned data, decompositions and model results.

pub mod series;

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::info;

use crate::analysis::correlation::correlation_matrix;
use crate::analysis::decomposition::{Decomposition, DecompositionIndex};
use crate::data::resample::{resample_mean, Frequency};
use crate::data::{HourlyFrame, PM25_UGM3, WEEKLY_WINDOW};
use crate::error::{Error, Result};
use crate::training::TrainingOutcome;
use crate::utils::io::output_path;
use crate::utils::plot::{create_plot, line_panel, padded_bounds, Line, CHART_SIZE};
use series::{coolwarm, days_since, monthly_groups, year_over_year};

pub const TIME_SERIES_FILE: &str = "pm25_time_series.png";
pub const CORRELATION_FILE: &str = "feature_correlations_rolling.png";
pub const MONTHLY_BOXPLOT_FILE: &str = "monthly_boxplots.png";
pub const YEAR_OVER_YEAR_FILE: &str = "year_over_year_comparison.png";
pub const PREDICTIONS_FILE: &str = "predictions_vs_actual.png";
pub const TRAINING_LOSS_FILE: &str = "lstm_training_loss.png";
pub const WEEKLY_DECOMPOSITION_FILE: &str = "seasonal_decomposition_weekly.png";
pub const ANNUAL_DECOMPOSITION_FILE: &str = "seasonal_decomposition_annual.png";

const PM25_LABEL: &str = "PM2.5 (µg/m³)";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Writes every chart into one output directory.
pub struct Visualizer {
    output_dir: PathBuf,
}

fn date_axis(origin: NaiveDate) -> impl Fn(&f64) -> String {
    move |x: &f64| {
        origin
            .checked_add_signed(Duration::days(x.round() as i64))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

impl Visualizer {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    fn target(&self, file_name: &str) -> Result<PathBuf> {
        output_path(&self.output_dir, file_name)
    }

    /// Daily and monthly mean PM2.5 in two stacked panels.
    pub fn plot_time_series(&self, frame: &HourlyFrame) -> Result<PathBuf> {
        let pm25 = frame.column(PM25_UGM3)?;
        let origin = frame
            .first_timestamp()
            .ok_or_else(|| Error::EmptyData("for the time series chart".into()))?
            .date();

        let to_points = |freq| -> Vec<(f64, Option<f64>)> {
            resample_mean(frame.timestamps(), pm25, freq)
                .into_iter()
                .map(|bin| (days_since(origin, bin.period), bin.mean))
                .collect()
        };
        let daily = Line::new("", BLUE, to_points(Frequency::Daily));
        let monthly = Line::new("", BLUE, to_points(Frequency::MonthStart));

        let path = self.target(TIME_SERIES_FILE)?;
        {
            let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE)?;
            let panels = root.split_evenly((2, 1));
            let axis = date_axis(origin);
            line_panel(&panels[0], "Daily Average PM2.5", PM25_LABEL, &[daily], &axis)?;
            line_panel(&panels[1], "Monthly Average PM2.5", PM25_LABEL, &[monthly], &axis)?;
            root.present()?;
        }

        info!(path = %path.display(), "saved time series chart");
        Ok(path)
    }

    /// Annotated heatmap of correlations between 7-day rolling means.
    pub fn plot_correlation_heatmap(&self, frame: &HourlyFrame) -> Result<PathBuf> {
        let corr = correlation_matrix(frame, WEEKLY_WINDOW);
        let n = corr.names.len() as u32;
        if n == 0 {
            return Err(Error::EmptyData("for the correlation heatmap".into()));
        }

        let path = self.target(CORRELATION_FILE)?;
        {
            let root = BitMapBackend::new(&path, (1200, 1000)).into_drawing_area();
            root.fill(&WHITE)?;

            // integer ranges include their end, so `0..n - 1` gives n cells
            let mut chart = ChartBuilder::on(&root)
                .caption("Feature Correlations (7-day Rolling Averages)", ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(140)
                .build_cartesian_2d((0u32..n - 1).into_segmented(), (0u32..n - 1).into_segmented())?;

            // first column at the top, like a printed matrix
            let row_of = |i: u32| n - 1 - i;
            let name = |i: u32| corr.names.get(i as usize).cloned().unwrap_or_default();
            let x_label = |v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => name(*i),
                _ => String::new(),
            };
            let y_label = |v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) if *i < n => name(row_of(*i)),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n as usize)
                .y_labels(n as usize)
                .x_label_formatter(&x_label)
                .y_label_formatter(&y_label)
                .draw()?;

            let right_edge = move |k: u32| {
                if k + 1 < n {
                    SegmentValue::Exact(k + 1)
                } else {
                    SegmentValue::Last
                }
            };

            chart.draw_series(corr.values.iter().enumerate().flat_map(|(i, row)| {
                row.iter().enumerate().map(move |(j, value)| {
                    let (r, g, b) = coolwarm(value.unwrap_or(0.0));
                    let (x, y) = (j as u32, row_of(i as u32));
                    Rectangle::new(
                        [
                            (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                            (right_edge(x), right_edge(y)),
                        ],
                        RGBColor(r, g, b).filled(),
                    )
                })
            }))?;

            let text_style = TextStyle::from(("sans-serif", 16).into_font())
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart.draw_series(corr.values.iter().enumerate().flat_map(|(i, row)| {
                let style = text_style.clone();
                row.iter().enumerate().map(move |(j, value)| {
                    let text = value.map_or_else(|| "nan".to_string(), |v| format!("{v:.2}"));
                    Text::new(
                        text,
                        (
                            SegmentValue::CenterOf(j as u32),
                            SegmentValue::CenterOf(row_of(i as u32)),
                        ),
                        style.clone(),
                    )
                })
            }))?;
            root.present()?;
        }

        info!(path = %path.display(), "saved correlation heatmap");
        Ok(path)
    }

    /// PM2.5 distribution per calendar month.
    pub fn plot_monthly_boxplots(&self, frame: &HourlyFrame) -> Result<PathBuf> {
        let groups = monthly_groups(frame)?;
        let (_, y_max) = padded_bounds(groups.values().flatten().copied());

        let path = self.target(MONTHLY_BOXPLOT_FILE)?;
        {
            let root = BitMapBackend::new(&path, (1200, 600)).into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Monthly Distribution of PM2.5", ("sans-serif", 28))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d((1u32..12u32).into_segmented(), 0f32..y_max as f32)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(12)
                .x_desc("Month")
                .y_desc(PM25_LABEL)
                .x_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(m) => MONTH_NAMES
                        .get((*m as usize).wrapping_sub(1))
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    _ => String::new(),
                })
                .draw()?;

            chart.draw_series(groups.iter().map(|(&month, values)| {
                Boxplot::new_vertical(SegmentValue::CenterOf(month), &Quartiles::new(values))
                    .width(30)
                    .whisker_width(0.5)
                    .style(BLUE)
            }))?;
            root.present()?;
        }

        info!(path = %path.display(), "saved monthly boxplots");
        Ok(path)
    }

    /// Weekly rolling mean PM2.5 for each year, overlaid by day of year.
    pub fn plot_year_over_year(&self, frame: &HourlyFrame) -> Result<PathBuf> {
        let lines: Vec<Line> = year_over_year(frame, WEEKLY_WINDOW)?
            .into_iter()
            .enumerate()
            .map(|(k, yl)| {
                let c = Palette99::pick(k).to_rgba();
                Line::new(yl.year.to_string(), RGBColor(c.0, c.1, c.2), yl.points)
            })
            .collect();

        let path = self.target(YEAR_OVER_YEAR_FILE)?;
        {
            let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE)?;
            let month_axis = |x: &f64| {
                NaiveDate::from_yo_opt(2001, x.clamp(1.0, 365.0) as u32)
                    .map(|d| MONTH_NAMES[d.month0() as usize].to_string())
                    .unwrap_or_default()
            };
            line_panel(&root, "Year-over-Year PM2.5 Comparison", PM25_LABEL, &lines, &month_axis)?;
            root.present()?;
        }

        info!(path = %path.display(), "saved year-over-year chart");
        Ok(path)
    }

    /// Actual test-split PM2.5 against both models' forecasts.
    pub fn plot_predictions(&self, outcome: &TrainingOutcome) -> Result<PathBuf> {
        let origin = outcome
            .test_timestamps
            .first()
            .copied()
            .ok_or_else(|| Error::EmptyData("for the prediction chart".into()))?;
        let hours: Vec<f64> = outcome
            .test_timestamps
            .iter()
            .map(|t| (*t - origin).num_minutes() as f64 / 60.0)
            .collect();
        let offset = hours.len() - outcome.lstm_predictions.len();

        let actual = Line::new(
            "Actual",
            BLACK,
            hours.iter().zip(&outcome.y_test).map(|(&h, &y)| (h, Some(y))).collect(),
        );
        let linear = Line::new(
            format!("Ridge (MAE {:.2})", outcome.linear_eval.mae),
            BLUE,
            hours
                .iter()
                .zip(&outcome.linear_predictions)
                .map(|(&h, &y)| (h, Some(y)))
                .collect(),
        );
        let lstm = Line::new(
            format!("LSTM (MAE {:.2})", outcome.lstm_eval.mae),
            RED,
            hours[offset..]
                .iter()
                .zip(&outcome.lstm_predictions)
                .map(|(&h, &y)| (h, Some(y)))
                .collect(),
        );

        let path = self.target(PREDICTIONS_FILE)?;
        {
            let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE)?;
            let axis = move |x: &f64| {
                (origin + Duration::minutes((x * 60.0).round() as i64))
                    .format("%Y-%m-%d")
                    .to_string()
            };
            line_panel(
                &root,
                "PM2.5 Forecasts vs Actual (test period)",
                PM25_LABEL,
                &[actual, linear, lstm],
                &axis,
            )?;
            root.present()?;
        }

        info!(path = %path.display(), "saved prediction chart");
        Ok(path)
    }

    pub fn plot_training_history(&self, outcome: &TrainingOutcome) -> Result<PathBuf> {
        let path = self.target(TRAINING_LOSS_FILE)?;
        create_plot(&outcome.history, &path)?;
        info!(path = %path.display(), "saved training loss chart");
        Ok(path)
    }

    /// Observed, trend, seasonal and residual panels.
    pub fn plot_decomposition(
        &self,
        index: &DecompositionIndex,
        decomposition: &Decomposition,
        title: &str,
        seasonal_label: &str,
        file_name: &str,
    ) -> Result<PathBuf> {
        let labels: Vec<String> = match index {
            DecompositionIndex::Hourly(ts) => ts.iter().map(|t| t.format("%Y-%m-%d").to_string()).collect(),
            DecompositionIndex::Monthly(ds) => ds.iter().map(|d| d.format("%Y-%m").to_string()).collect(),
        };
        let axis = |x: &f64| {
            labels
                .get(x.round().max(0.0) as usize)
                .cloned()
                .unwrap_or_default()
        };
        let indexed = |values: &[f64]| -> Vec<(f64, Option<f64>)> {
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, Some(v)))
                .collect()
        };

        let path = self.target(file_name)?;
        {
            let root = BitMapBackend::new(&path, (1400, 1000)).into_drawing_area();
            root.fill(&WHITE)?;
            let (title_area, body) = root.split_vertically(40);
            title_area.titled(title, ("sans-serif", 28))?;
            let panels = body.split_evenly((4, 1));

            let components = [
                ("Observed", &decomposition.observed),
                ("Trend", &decomposition.trend),
                (seasonal_label, &decomposition.seasonal),
                ("Residual", &decomposition.residual),
            ];
            for (panel, (name, values)) in panels.iter().zip(components) {
                line_panel(panel, name, name, &[Line::new("", BLUE, indexed(values))], &axis)?;
            }
            root.present()?;
        }

        info!(path = %path.display(), "saved decomposition chart");
        Ok(path)
    }
}
