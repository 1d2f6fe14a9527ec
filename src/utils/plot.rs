use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::Result;
use crate::training::history::TrainingHistory;

pub const CHART_SIZE: (u32, u32) = (1400, 800);

/// A named series; `None` values break the line.
pub struct Line {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, Option<f64>)>,
}

impl Line {
    pub fn new(label: impl Into<String>, color: RGBColor, points: Vec<(f64, Option<f64>)>) -> Self {
        Self {
            label: label.into(),
            color,
            points,
        }
    }
}

/// Splits a series into runs of consecutive present, finite values.
pub fn segments(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in points {
        match y.filter(|v| v.is_finite()) {
            Some(y) => current.push((x, y)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Finite min and max, or `None` if there are no finite values
pub fn bounds<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Bounds widened by 5% so lines do not touch the frame
pub fn padded_bounds<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    match bounds(values) {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        Some((v, _)) => (v - 1.0, v + 1.0),
        None => (0.0, 1.0),
    }
}

/// Draws one line chart with a shared legend into `area`.
pub fn line_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    lines: &[Line],
    x_label: &dyn Fn(&f64) -> String,
) -> Result<()> {
    let (x_min, x_max) = bounds(lines.iter().flat_map(|l| l.points.iter().map(|p| p.0)))
        .filter(|(lo, hi)| hi > lo)
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = padded_bounds(lines.iter().flat_map(|l| l.points.iter().filter_map(|p| p.1)));

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_desc)
        .x_label_formatter(x_label)
        .draw()?;

    for line in lines {
        let color = line.color;
        for (k, run) in segments(&line.points).into_iter().enumerate() {
            let series = chart.draw_series(LineSeries::new(run, &color))?;
            if k == 0 && !line.label.is_empty() {
                series
                    .label(line.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }
    }

    if lines.iter().any(|l| !l.label.is_empty()) {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    Ok(())
}

/// Per-epoch training loss of the sequence model
pub fn create_plot(history: &TrainingHistory, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let loss = Line::new(
        "MAE loss",
        BLUE,
        history
            .epochs
            .iter()
            .zip(&history.losses)
            .map(|(&epoch, &loss)| (epoch as f64, Some(loss)))
            .collect(),
    );
    line_panel(&root, "LSTM Training Progress", "Loss", &[loss], &|x| format!("{x:.0}"))?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_break_on_gaps_and_nan() {
        let points = vec![
            (0.0, Some(1.0)),
            (1.0, Some(2.0)),
            (2.0, None),
            (3.0, Some(f64::NAN)),
            (4.0, Some(5.0)),
            (5.0, None),
        ];
        assert_eq!(
            segments(&points),
            vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(4.0, 5.0)]]
        );
        assert!(segments(&[(0.0, None)]).is_empty());
    }

    #[test]
    fn bounds_ignore_non_finite_values() {
        assert_eq!(bounds([3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(bounds(Vec::<f64>::new()), None);
        assert_eq!(padded_bounds([0.0, 10.0]), (-0.5, 10.5));
        assert_eq!(padded_bounds([4.0]), (3.0, 5.0));
        assert_eq!(padded_bounds([f64::INFINITY]), (0.0, 1.0));
    }
}
