//! Local-time calendar helpers.
//!
//! Snapshots are stored as unix seconds but browsed by local calendar day.
//! Every day boundary in the crate comes from [`day_bounds`] so that all
//! callers agree on membership, including on 23- and 25-hour DST days.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

const MINUTES_PER_DAY: u32 = 24 * 60;

pub fn from_unix(secs: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .with_timezone(&Local)
}

pub fn local_day(secs: i64) -> NaiveDate {
    from_unix(secs).date_naive()
}

/// First instant of `day` in local time. When midnight falls in a DST gap
/// the day starts at the first local minute that exists.
pub fn start_of_day(day: NaiveDate) -> DateTime<Local> {
    (0..MINUTES_PER_DAY)
        .find_map(|minute| {
            let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)?;
            Local.from_local_datetime(&day.and_time(time)).earliest()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&day.and_time(NaiveTime::default())))
}

/// Half-open `[start, end)` range of unix seconds covering the local `day`.
pub fn day_bounds(day: NaiveDate) -> (i64, i64) {
    let start = start_of_day(day).timestamp();
    let end = day
        .succ_opt()
        .map(|next| start_of_day(next).timestamp())
        .unwrap_or(start + 86_400);
    (start, end)
}

/// Parse a zero-padded `YYYY-MM-DD` day. Unpadded forms like `2013-1-6`
/// are rejected so each day has exactly one path.
pub fn parse_day(date: &str) -> Result<NaiveDate> {
    let day =
        NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| Error::invalid_timestamp(date, e))?;
    if format_day(day) != date {
        return Err(Error::invalid_timestamp(date, "expected YYYY-MM-DD"));
    }
    Ok(day)
}

/// Resolve a `YYYY-MM-DD` date and `HH:MM:SS` time in the local zone.
/// Ambiguous wall-clock times (DST fall-back) resolve to the earlier instant.
pub fn parse_instant(date: &str, time: &str) -> Result<DateTime<Local>> {
    let input = format!("{date} {time}");
    let format = format!("{DATE_FORMAT} {TIME_FORMAT}");
    let naive = NaiveDateTime::parse_from_str(&input, &format)
        .map_err(|e| Error::invalid_timestamp(&input, e))?;

    // chrono reads second 60 as a leap second, which would alias :59
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(Error::invalid_timestamp(input, "second out of range"));
    }
    if naive.format(&format).to_string() != input {
        return Err(Error::invalid_timestamp(input, "expected YYYY-MM-DD HH:MM:SS"));
    }

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::invalid_timestamp(input, "does not exist in the local time zone"))
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

pub fn format_date(timestamp: &DateTime<Local>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

pub fn format_time(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIME_FORMAT).to_string()
}

pub fn format_datetime(timestamp: &DateTime<Local>) -> String {
    timestamp.format(DATETIME_FORMAT).to_string()
}
