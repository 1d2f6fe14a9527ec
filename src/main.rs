use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use pm25_station::analysis::{annual_decomposition, weekly_decomposition};
use pm25_station::data::frame::DescribeTable;
use pm25_station::data::FEATURE_COLUMNS;
use pm25_station::training::save_models;
use pm25_station::utils::input::get_stdin_input;
use pm25_station::visualization::{ANNUAL_DECOMPOSITION_FILE, WEEKLY_DECOMPOSITION_FILE};
use pm25_station::{
    logging, train_models, CleaningReport, Config, Error, FeatureTable, HourlyFrame, ModelKind, Predictor,
    StationLoader, Visualizer,
};

#[derive(Parser)]
#[command(name = "pm25-station")]
#[command(about = "Hourly PM2.5 station analysis and forecasting", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the export and print coverage and column statistics
    Summary {
        /// Station spreadsheet (.xlsx, .xls, .ods) or its CSV export
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Render the descriptive charts
    Visualize {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Weekly and annual seasonal decompositions
    Analyze {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Train, evaluate and save both forecasters
    Train {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Forecast PM2.5 from a feature CSV, or from values typed at the prompt
    Predict {
        /// CSV with a header naming the feature columns
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ModelKind::Linear)]
        model: ModelKind,

        /// Write forecasts to this CSV instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_frame(path: &Path, config: &Config) -> Result<(HourlyFrame, CleaningReport)> {
    StationLoader::new(path, config.data.clone())
        .load_and_clean()
        .with_context(|| format!("failed to load {}", path.display()))
}

fn print_summary(frame: &HourlyFrame, report: &CleaningReport) {
    println!("Rows read:              {}", report.rows_read);
    println!("Stray header rows:      {}", report.stray_headers);
    println!("Non-standard times:     {}", report.non_standard_times);
    println!("24:00 rollovers:        {}", report.end_of_day_rollovers);
    println!("Invalid datetimes:      {}", report.invalid_datetimes);
    println!("Negative PM2.5:         {}", report.negative_pm25);
    println!("Missing PM2.5:          {}", report.missing_pm25);
    println!("Duplicate timestamps:   {}", report.duplicate_timestamps);
    println!("Incomplete rows:        {}", report.incomplete_rows);
    println!("Rows kept:              {}", report.rows_kept);
    if let (Some(first), Some(last)) = (frame.first_timestamp(), frame.last_timestamp()) {
        println!("Coverage:               {first} to {last}");
    }
    println!();
    print!("{}", DescribeTable(&frame.describe()));
}

fn visualize(frame: &HourlyFrame, visualizer: &Visualizer) -> Result<()> {
    let charts = [
        visualizer.plot_time_series(frame)?,
        visualizer.plot_correlation_heatmap(frame)?,
        visualizer.plot_monthly_boxplots(frame)?,
        visualizer.plot_year_over_year(frame)?,
    ];
    for path in charts {
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn analyze(frame: &HourlyFrame, visualizer: &Visualizer) -> Result<()> {
    let (index, weekly) = weekly_decomposition(frame).context("weekly decomposition failed")?;
    let path = visualizer.plot_decomposition(
        &index,
        &weekly,
        "Weekly Seasonal Decomposition of PM2.5",
        "Weekly Seasonality",
        WEEKLY_DECOMPOSITION_FILE,
    )?;
    println!("Saved {}", path.display());

    match annual_decomposition(frame) {
        Ok((index, annual)) => {
            let path = visualizer.plot_decomposition(
                &index,
                &annual,
                "Annual Seasonal Decomposition of PM2.5",
                "Annual Seasonality",
                ANNUAL_DECOMPOSITION_FILE,
            )?;
            println!("Saved {}", path.display());
        }
        Err(Error::InsufficientData(reason)) => {
            warn!(%reason, "skipping annual decomposition, need at least 24 months of data");
        }
        Err(e) => return Err(e).context("annual decomposition failed"),
    }
    Ok(())
}

fn train(frame: &HourlyFrame, config: &Config, visualizer: &Visualizer) -> Result<()> {
    let outcome = train_models(frame, &config.training).context("training failed")?;
    let files = save_models(&outcome, &config.output.model_dir)?;

    println!("Model performance on the test split:");
    println!(
        "  Ridge regression  MAE {:.3}  RMSE {:.3}",
        outcome.linear_eval.mae, outcome.linear_eval.rmse
    );
    println!(
        "  LSTM              MAE {:.3}  RMSE {:.3}",
        outcome.lstm_eval.mae, outcome.lstm_eval.rmse
    );
    if let Some(loss) = outcome.history.final_loss() {
        println!("  LSTM final training loss {loss:.3}");
    }
    println!("Saved {}", files.linear.display());
    println!("Saved {}", files.lstm.display());
    println!("Saved {}", files.scaler.display());

    println!("Saved {}", visualizer.plot_predictions(&outcome)?.display());
    println!("Saved {}", visualizer.plot_training_history(&outcome)?.display());
    Ok(())
}

/// One row per feature, or a full window of rows for the LSTM.
fn prompt_features(rows: usize) -> Result<FeatureTable> {
    let mut columns: Vec<(String, Vec<f64>)> = FEATURE_COLUMNS
        .iter()
        .map(|name| (name.to_string(), Vec::with_capacity(rows)))
        .collect();

    println!("Enter feature values to predict PM2.5:");
    for row in 0..rows {
        if rows > 1 {
            println!("Row {} of {rows}", row + 1);
        }
        for (name, values) in columns.iter_mut() {
            values.push(get_stdin_input(&format!("{name}: "))?);
        }
    }
    Ok(FeatureTable::from_columns(columns)?)
}

fn predict(config: &Config, input: Option<&Path>, kind: ModelKind, output: Option<&Path>) -> Result<()> {
    let predictor = Predictor::load(&config.output.model_dir)?;

    let table = match input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            FeatureTable::from_csv(file).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => {
            let rows = match kind {
                ModelKind::Linear => 1,
                ModelKind::Lstm => predictor.lstm_window(),
            };
            prompt_features(rows)?
        }
    };
    if table.is_empty() {
        bail!("no feature rows to predict");
    }

    let predictions = predictor.predict(&table, kind)?;
    let first_row = table.len() - predictions.len();
    info!(rows = predictions.len(), model = %kind, "predicted");

    match output {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writer.write_record(["row", "pm25_prediction"])?;
            for (k, value) in predictions.iter().enumerate() {
                writer.write_record([(first_row + k).to_string(), format!("{value:.4}")])?;
            }
            writer.flush()?;
            println!("Saved {} predictions to {}", predictions.len(), path.display());
        }
        None if predictions.len() == 1 => {
            println!("Predicted PM2.5 ({kind}): {:.2} µg/m³", predictions[0]);
        }
        None => {
            for (k, value) in predictions.iter().enumerate() {
                println!("row {:>5}: {value:.2}", first_row + k);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    logging::init(&level);

    let visualizer = Visualizer::new(&config.output.image_dir);

    match cli.command {
        Commands::Summary { data } => {
            let (frame, report) = load_frame(&data, &config)?;
            print_summary(&frame, &report);
        }
        Commands::Visualize { data } => {
            let (frame, _) = load_frame(&data, &config)?;
            visualize(&frame, &visualizer)?;
        }
        Commands::Analyze { data } => {
            let (frame, _) = load_frame(&data, &config)?;
            analyze(&frame, &visualizer)?;
        }
        Commands::Train { data } => {
            let (frame, _) = load_frame(&data, &config)?;
            train(&frame, &config, &visualizer)?;
        }
        Commands::Predict { input, model, output } => {
            predict(&config, input.as_deref(), model, output.as_deref())?;
        }
    }
    Ok(())
}
