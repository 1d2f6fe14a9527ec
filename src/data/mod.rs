//! Loading, cleaning and reshaping of hourly station exports.

pub mod datetime;
pub mod frame;
pub mod loader;
pub mod preprocessing;
pub mod resample;
pub mod stats;

pub use frame::{ColumnSummary, HourlyFrame};
pub use loader::{CleaningReport, RawReading, StationLoader};
pub use preprocessing::StandardScaler;
pub use resample::{resample_mean, rolling_mean, Bin, Frequency};

pub const TEMP_C: &str = "temp_c";
pub const WIND_SPEED_MS: &str = "wind_speed_ms";
pub const PM25_UGM3: &str = "pm25_ugm3";
pub const HUMIDITY_PCT: &str = "humidity_pct";
pub const HOUR: &str = "hour";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const PM25_LAG_1H: &str = "pm25_lag1h";
pub const PM25_24H_AVG: &str = "pm25_24h_avg";

/// Model inputs, in the order the scaler and both models expect them
pub const FEATURE_COLUMNS: [&str; 6] = [
    HOUR,
    DAY_OF_WEEK,
    TEMP_C,
    WIND_SPEED_MS,
    PM25_24H_AVG,
    PM25_LAG_1H,
];

pub const TARGET_COLUMN: &str = PM25_UGM3;

/// Rows in the trailing PM2.5 average
pub const DAILY_WINDOW: usize = 24;

/// Rows in a week of hourly readings
pub const WEEKLY_WINDOW: usize = 24 * 7;
