use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Error type for date parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("not a date: {0:?} (expected YYYY-MM-DD, RFC 3339 or epoch milliseconds)")]
    InvalidDate(String),
}

/// Urgency of a due date relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueClass {
    /// Due before today
    Overdue,
    /// Due today
    DueToday,
    /// Due within the next 7 days
    DueSoon,
    /// Due more than a week from now
    Later,
}

impl DueClass {
    /// Classify a day offset as returned by [`relative_days`].
    pub fn from_offset(days: i64) -> Self {
        match days {
            d if d < 0 => DueClass::Overdue,
            0 => DueClass::DueToday,
            1..=7 => DueClass::DueSoon,
            _ => DueClass::Later,
        }
    }

    /// Short label used for badges and group headers
    pub fn label(self) -> &'static str {
        match self {
            DueClass::Overdue => "overdue",
            DueClass::DueToday => "today",
            DueClass::DueSoon => "soon",
            DueClass::Later => "later",
        }
    }
}

impl std::fmt::Display for DueClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Day arithmetic
// ---------------------------------------------------------------------------

/// The current calendar day in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Truncate a timestamp to its calendar day in local time.
pub fn date_only(ts: &DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// Local midnight of `date`, as a UTC timestamp.
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // midnight skipped by a DST jump
        None => naive.and_utc(),
    }
}

/// Local midnight `days` days after (or before, when negative) `date`.
pub fn days_from(date: NaiveDate, days: i64) -> DateTime<Utc> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    local_midnight(shifted.unwrap_or(date))
}

/// Whole days between `today` and the day of `due`. Negative means overdue.
pub fn relative_days_on(due: &DateTime<Utc>, today: NaiveDate) -> i64 {
    (date_only(due) - today).num_days()
}

/// Whole days between today and the day of `due`.
pub fn relative_days(due: &DateTime<Utc>) -> i64 {
    relative_days_on(due, today())
}

pub fn classify_on(due: &DateTime<Utc>, today: NaiveDate) -> DueClass {
    DueClass::from_offset(relative_days_on(due, today))
}

pub fn classify(due: &DateTime<Utc>) -> DueClass {
    classify_on(due, today())
}

// ---------------------------------------------------------------------------
// Parsing and formatting
// ---------------------------------------------------------------------------

/// Parse user or file supplied date text.
///
/// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD` dates (local midnight) and
/// integer epoch milliseconds.
pub fn parse_date_input(input: &str) -> Result<DateTime<Utc>, DateError> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(local_midnight(date));
    }
    if let Ok(ms) = trimmed.parse::<i64>()
        && let Some(ts) = DateTime::from_timestamp_millis(ms)
    {
        return Ok(ts);
    }
    Err(DateError::InvalidDate(input.to_string()))
}

/// `DD.MM.YYYY` in local time, or `-` when there is no date.
pub fn format_date_display(date: Option<&DateTime<Utc>>) -> String {
    match date {
        Some(ts) => ts.with_timezone(&Local).format("%d.%m.%Y").to_string(),
        None => "-".to_string(),
    }
}

/// `YYYY-MM-DD` in local time, or an empty string when there is no date.
pub fn format_date_value(date: Option<&DateTime<Utc>>) -> String {
    match date {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

fn to_wire(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp as found in a serialized tree
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

impl RawTimestamp {
    /// `Ok(None)` for an empty string, which older exports use for "no date".
    fn into_datetime(self) -> Result<Option<DateTime<Utc>>, DateError> {
        match self {
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| DateError::InvalidDate(ms.to_string())),
            RawTimestamp::Float(ms) => DateTime::from_timestamp_millis(ms as i64)
                .map(Some)
                .ok_or_else(|| DateError::InvalidDate(ms.to_string())),
            RawTimestamp::Text(s) if s.trim().is_empty() => Ok(None),
            RawTimestamp::Text(s) => parse_date_input(&s).map(Some),
        }
    }
}

/// Serde adapter for required timestamps.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{DateError, RawTimestamp, to_wire};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&to_wire(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        RawTimestamp::deserialize(d)?
            .into_datetime()
            .and_then(|ts| ts.ok_or_else(|| DateError::InvalidDate(String::new())))
            .map_err(de::Error::custom)
    }
}

/// Serde adapter for optional timestamps (`null`, missing or empty string is none).
pub mod optional_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{RawTimestamp, to_wire};

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_some(&to_wire(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<RawTimestamp>::deserialize(d)? {
            Some(raw) => raw.into_datetime().map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
