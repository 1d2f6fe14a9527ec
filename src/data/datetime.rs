//! Repair of the export's date/time encoding.
//!
//! The station export stores the reading time as a separate `HH:MM` string and
//! labels the last reading of each day `24:00`, which no datetime parser
//! accepts. That reading belongs to `00:00` of the following day.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

/// End-of-day notation used by the export
pub const END_OF_DAY: &str = "24:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairedTimestamp {
    pub timestamp: NaiveDateTime,
    /// True when a `24:00` reading was moved to midnight of the next day
    pub rolled_over: bool,
}

/// `HH:MM` with exactly two digits on each side
pub fn is_standard_time(time: &str) -> bool {
    let bytes = time.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit())
}

fn is_end_of_day(time: &str) -> bool {
    time == END_OF_DAY || time == "24:00:00"
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()
}

/// Combines a date and time string into one timestamp, or `None` if either
/// part is unparseable.
pub fn repair_datetime(date: &str, time: &str, date_format: &str) -> Option<RepairedTimestamp> {
    let date = NaiveDate::parse_from_str(date.trim(), date_format).ok()?;
    let time = time.trim();

    if is_end_of_day(time) {
        let next_day = date.checked_add_days(Days::new(1))?;
        return Some(RepairedTimestamp {
            timestamp: next_day.and_hms_opt(0, 0, 0)?,
            rolled_over: true,
        });
    }

    Some(RepairedTimestamp {
        timestamp: date.and_time(parse_time(time)?),
        rolled_over: false,
    })
}
