//! Extraction of calendar dates from the encodings council APIs emit.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;

static EPOCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Date\((\d+)\)").expect("valid epoch regex"));
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^2\d{3}-\d{2}-\d{2}").expect("valid iso date regex"));

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Time zone used to turn an epoch timestamp into a calendar day.
pub enum EpochZone {
    /// Coordinated Universal Time.
    #[default]
    Utc,
    /// Time zone of the running process.
    Local,
}

/// Extract a calendar date, reading epoch timestamps in UTC.
///
/// See [`extract_date_in`].
#[must_use]
pub fn extract_date(value: &str) -> Option<NaiveDate> {
    extract_date_in(value, EpochZone::Utc)
}

/// Extract a calendar date from `value`.
///
/// Two encodings are recognised, tried in order:
///
/// 1. `Date(<millis>)` anywhere in the string, e.g. `/Date(1588723200000)/`.
///    The milliseconds are truncated to whole seconds and the resulting
///    instant is read as a day in `zone`.
/// 2. A `YYYY-MM-DD` prefix with a year from 2000 to 2999, e.g.
///    `2024-05-10T00:00:00`.
///
/// Returns `None` when neither encoding yields a valid date.
#[must_use]
pub fn extract_date_in(value: &str, zone: EpochZone) -> Option<NaiveDate> {
    EPOCH_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|millis| epoch_date(millis.as_str(), zone))
        .or_else(|| iso_date(value))
}

fn epoch_date(millis: &str, zone: EpochZone) -> Option<NaiveDate> {
    let millis = millis.parse::<i64>().ok()?;
    let instant = DateTime::from_timestamp(millis / 1000, 0)?;
    let date = match zone {
        EpochZone::Utc => instant.date_naive(),
        EpochZone::Local => instant.with_timezone(&Local).date_naive(),
    };
    Some(date)
}

fn iso_date(value: &str) -> Option<NaiveDate> {
    let prefix = ISO_DATE_RE.find(value)?;
    NaiveDate::parse_from_str(prefix.as_str(), ISO_DATE_FORMAT).ok()
}
