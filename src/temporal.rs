//! observedAt timestamp normalization
//!
//! NGSI-LD carries observation times as ISO 8601 extended-format text.
//! Callers may supply already-formatted text, which passes through
//! unchanged, or a chrono datetime. Zoned datetimes render directly;
//! naive datetimes are completed with a zone offset first, by default
//! the host's local zone.

use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use serde_json::Value;

use crate::error::NgsildError;

/// A timestamp input for the `observedAt` field of an attribute.
///
/// A chrono zoned value always carries a concrete UTC offset, so every
/// `Aware` input can locate itself on the timeline without further
/// resolution. `Naive` inputs carry no zone information and are
/// resolved at normalization time.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    /// Already-formatted text, passed through without validation.
    Text(String),
    /// A datetime with a concrete UTC offset.
    Aware(DateTime<FixedOffset>),
    /// A datetime without zone information.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Render to ISO 8601 extended format.
    ///
    /// Naive values are resolved against the host's local zone at the
    /// instant they describe, which makes the output depend on the zone
    /// configuration of the executing machine. Use
    /// [`Timestamp::to_iso8601_with_zone`] when that is not acceptable.
    pub fn to_iso8601(&self) -> String {
        match self {
            Timestamp::Text(text) => text.clone(),
            Timestamp::Aware(dt) => render(dt),
            Timestamp::Naive(naive) => render(&attach_local_zone(*naive)),
        }
    }

    /// Render to ISO 8601 extended format, resolving naive values
    /// against an explicit fallback offset instead of the host zone.
    pub fn to_iso8601_with_zone(&self, fallback: FixedOffset) -> String {
        match self {
            Timestamp::Text(text) => text.clone(),
            Timestamp::Aware(dt) => render(dt),
            Timestamp::Naive(naive) => render(&attach_zone(*naive, fallback)),
        }
    }
}

fn render(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Interpret `naive` as wall-clock time at `offset`. A fixed offset
/// maps every wall-clock time to exactly one instant.
fn attach_zone(naive: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    naive.and_local_timezone(offset).single().unwrap_or_else(|| {
        let utc = naive - chrono::TimeDelta::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, offset)
    })
}

fn attach_local_zone(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.fixed_offset(),
        LocalResult::Ambiguous(earliest, _) => earliest.fixed_offset(),
        // The wall-clock time falls in a DST gap; resolve with the
        // offset in force right now.
        LocalResult::None => attach_zone(naive, *Local::now().offset()),
    }
}

impl From<&str> for Timestamp {
    fn from(text: &str) -> Self {
        Timestamp::Text(text.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(text: String) -> Self {
        Timestamp::Text(text)
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Timestamp::Aware(dt)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Aware(dt.fixed_offset())
    }
}

impl From<DateTime<Local>> for Timestamp {
    fn from(dt: DateTime<Local>) -> Self {
        Timestamp::Aware(dt.fixed_offset())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(naive: NaiveDateTime) -> Self {
        Timestamp::Naive(naive)
    }
}

impl TryFrom<&Value> for Timestamp {
    type Error = NgsildError;

    /// Only JSON strings are accepted as timestamps; any other JSON
    /// type fails with [`NgsildError::InvalidTimestamp`].
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Timestamp::Text(text.clone())),
            other => Err(NgsildError::InvalidTimestamp(
                json_type_name(other).to_string(),
            )),
        }
    }
}

impl TryFrom<Value> for Timestamp {
    type Error = NgsildError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Timestamp::try_from(&value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
