use chrono::NaiveDateTime;

use super::Precision;

/// Date time layouts accepted by [`normalize`], tried in this order.
/// Day-first comes first, so a string matching more than one layout takes the first one.
pub const DATE_TIME_PATTERNS: &[&str] = &["%d.%m.%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp as handed over by the caller: either an epoch already expressed in the
/// target precision, or a human readable date time string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampInput {
    Epoch(i64),
    Text(String),
}

impl From<i64> for TimestampInput {
    fn from(value: i64) -> Self {
        Self::Epoch(value)
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Convert the input to an epoch value at `precision`.
///
/// - Epoch values are returned unchanged.
/// - Strings are parsed as naive date times (no timezone conversion, taken as UTC)
///   with the first matching layout of [`DATE_TIME_PATTERNS`].
/// - Sub-unit parts are truncated toward zero, e.g. `10:36:43.567` at second precision loses `.567`.
///
/// Returns `None` when the string matches none of the layouts.
pub fn normalize(input: impl Into<TimestampInput>, precision: Precision) -> Option<i64> {
    match input.into() {
        TimestampInput::Epoch(n) => Some(n),
        TimestampInput::Text(s) => parse_date_time(&s).and_then(|dt| epoch_at_precision(&dt, precision)),
    }
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    DATE_TIME_PATTERNS.iter().find_map(|pattern| match NaiveDateTime::parse_from_str(s, pattern) {
        Ok(dt) => Some(dt),
        Err(e) => {
            log::trace!("date time {} does not match {}: {}", s, pattern, e);
            None
        }
    })
}

fn epoch_at_precision(dt: &NaiveDateTime, precision: Precision) -> Option<i64> {
    let utc = dt.and_utc();
    let nanos = utc.timestamp() as i128 * 1_000_000_000 + utc.timestamp_subsec_nanos() as i128;

    i64::try_from(nanos / precision.nanos_per_unit()).ok()
}
